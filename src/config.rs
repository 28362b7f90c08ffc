use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub status_interval: Duration,
    pub camera_settle: Duration,
    pub camera_command: Option<String>,
    pub session_file: PathBuf,
    pub history_page_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: Duration::from_secs(30),
            status_interval: Duration::from_millis(1500),
            camera_settle: Duration::from_millis(1000),
            camera_command: None,
            session_file: PathBuf::from(".eco-collect").join("session.json"),
            history_page_limit: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let api_base_url = std::env::var("ECO_API_URL")
            .unwrap_or(defaults.api_base_url)
            .trim_end_matches('/')
            .to_string();

        let request_timeout =
            Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS")?.unwrap_or(30));
        let status_interval =
            Duration::from_millis(parse_var("STATUS_INTERVAL_MS")?.unwrap_or(1500));
        let camera_settle = Duration::from_millis(parse_var("CAMERA_SETTLE_MS")?.unwrap_or(1000));

        let camera_command = std::env::var("CAMERA_COMMAND")
            .ok()
            .filter(|c| !c.trim().is_empty());

        let session_file = std::env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);

        let history_page_limit = parse_var("HISTORY_PAGE_LIMIT")?
            .map(|v: u64| v as usize)
            .unwrap_or(defaults.history_page_limit);

        Ok(Self {
            api_base_url,
            request_timeout,
            status_interval,
            camera_settle,
            camera_command,
            session_file,
            history_page_limit,
        })
    }
}

fn parse_var(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} must be a whole number, got {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}
