use std::{
    env,
    net::{AddrParseError, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use thiserror::Error;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_STORE_DIR: &str = "data/ledger";
const DEFAULT_POLL_INTERVAL_SECS: u64 = quotes::DEFAULT_POLL_INTERVAL.as_secs();
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

const ENV_ADDR: &str = "DASHBOARD_ADDR";
const ENV_API_URL: &str = "DASHBOARD_API_URL";
const ENV_STORE_DIR: &str = "DASHBOARD_STORE_DIR";
const ENV_POLL_INTERVAL: &str = "DASHBOARD_POLL_INTERVAL_SECS";
const ENV_HTTP_TIMEOUT: &str = "DASHBOARD_HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub api_url: String,
    pub store_dir: PathBuf,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DASHBOARD_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),
    #[error("DASHBOARD_API_URL must start with http:// or https://")]
    InvalidApiUrl,
    #[error("DASHBOARD_STORE_DIR must not be empty or whitespace")]
    InvalidStoreDir,
    #[error("DASHBOARD_POLL_INTERVAL_SECS must be a whole number of seconds between 1 and 3600")]
    InvalidPollInterval,
    #[error("DASHBOARD_HTTP_TIMEOUT_SECS must be a whole number of seconds between 1 and 300")]
    InvalidHttpTimeout,
    #[error("{0} contains non-unicode data")]
    NonUnicode(&'static str),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match read_env(ENV_ADDR)? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => DEFAULT_LISTEN_ADDR
                .parse()
                .map_err(ConfigError::InvalidListenAddr)?,
        };

        let api_url = match read_env(ENV_API_URL)? {
            Some(value) => {
                let value = value.trim().to_owned();
                let has_host = value
                    .strip_prefix("http://")
                    .or_else(|| value.strip_prefix("https://"))
                    .is_some_and(|rest| !rest.is_empty());
                if !has_host {
                    return Err(ConfigError::InvalidApiUrl);
                }
                value
            }
            None => DEFAULT_API_URL.to_owned(),
        };

        let store_dir = match read_env(ENV_STORE_DIR)? {
            Some(value) => {
                if value.trim().is_empty() {
                    return Err(ConfigError::InvalidStoreDir);
                }
                PathBuf::from(value)
            }
            None => PathBuf::from(DEFAULT_STORE_DIR),
        };

        let poll_interval = parse_seconds_env(
            ENV_POLL_INTERVAL,
            DEFAULT_POLL_INTERVAL_SECS,
            3_600,
            ConfigError::InvalidPollInterval,
        )?;

        let http_timeout = parse_seconds_env(
            ENV_HTTP_TIMEOUT,
            DEFAULT_HTTP_TIMEOUT_SECS,
            300,
            ConfigError::InvalidHttpTimeout,
        )?;

        Ok(Self {
            listen_addr,
            api_url,
            store_dir,
            poll_interval,
            http_timeout,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode(key)),
    }
}

fn parse_seconds_env(
    key: &'static str,
    default_secs: u64,
    max_secs: u64,
    invalid_error: ConfigError,
) -> Result<Duration, ConfigError> {
    let secs = match read_env(key)? {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(secs) if (1..=max_secs).contains(&secs) => secs,
            _ => return Err(invalid_error),
        },
        None => default_secs,
    };

    Ok(Duration::from_secs(secs))
}
