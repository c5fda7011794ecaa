pub fn module_ready() -> bool {
    true
}

pub fn index_html() -> &'static str {
    include_str!("../static/index.html")
}

pub fn styles_css() -> &'static str {
    include_str!("../static/styles.css")
}

pub fn app_js() -> &'static str {
    include_str!("../static/app.js")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_bundle_contains_index_html() {
        let html = index_html();

        assert!(html.contains("<!doctype html>"));
        assert!(html.contains("/static/styles.css"));
        assert!(html.contains("/static/app.js"));
    }

    #[test]
    fn ui_shell_contains_trading_panels() {
        let html = index_html();
        assert!(html.contains("Position"));
        assert!(html.contains("Wallet Balance"));
        assert!(html.contains("Recent Orders"));
    }

    #[test]
    fn ui_shell_has_history_and_prediction_charts() {
        let html = index_html();
        assert!(html.contains(r#"id="chart-history""#));
        assert!(html.contains(r#"id="chart-prediction""#));

        let js = app_js();
        assert!(js.contains("analysis.history"));
        assert!(js.contains("analysis.prediction"));
        assert!(js.contains("polyline"));
        assert!(js.contains("No chart data available."));
    }

    #[test]
    fn app_script_refreshes_ledger_on_order_events() {
        let js = app_js();
        assert!(js.contains(r#"event.event_type === "order_placed""#));
    }

    #[test]
    fn app_script_talks_to_dashboard_routes() {
        let js = app_js();
        for route in ["/analysis", "/orders", "/portfolio", "/ws/events"] {
            assert!(js.contains(route), "missing {route}");
        }
    }
}
