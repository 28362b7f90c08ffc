use std::sync::Arc;

use crate::api::ApiClient;
use crate::capture::CommandCamera;
use crate::config::Config;
use crate::error::{Result, ValidationError};
use crate::session::{Session, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(config.api_base_url.clone(), config.request_timeout)?;
        let sessions = SessionStore::new(config.session_file.clone());
        Ok(Self {
            api,
            config: Arc::new(config),
            sessions: Arc::new(sessions),
        })
    }

    pub async fn session(&self) -> Result<Option<Session>> {
        self.sessions.load().await
    }

    pub async fn require_session(&self) -> Result<Session> {
        self.session()
            .await?
            .ok_or_else(|| ValidationError::NotAuthenticated.into())
    }

    /// `None` when no capture command is configured.
    pub fn camera(&self) -> Option<CommandCamera> {
        self.config
            .camera_command
            .as_deref()
            .and_then(CommandCamera::from_command_line)
    }
}
