use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use crate::state::{AppState, DashboardEvent};

pub async fn events_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stream_events(socket, state))
}

async fn stream_events(mut socket: WebSocket, state: AppState) {
    let mut events = state.subscribe_events();
    let mut quotes = state.board().subscribe();

    let symbol = state.board().current().map(|analysis| analysis.symbol);
    let connected = DashboardEvent::connected(symbol);
    if send_event(&mut socket, &connected).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => return,
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                }
            }
            changed = quotes.changed() => {
                if changed.is_err() {
                    return;
                }
                let event = quotes
                    .borrow_and_update()
                    .as_ref()
                    .map(DashboardEvent::quote_updated);
                if let Some(event) = event {
                    if send_event(&mut socket, &event).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &DashboardEvent) -> Result<(), ()> {
    let payload = event_json(event)?;
    socket.send(Message::Text(payload)).await.map_err(|_| ())
}

fn event_json(event: &DashboardEvent) -> Result<String, ()> {
    serde_json::to_string(event).map_err(|_| ())
}
