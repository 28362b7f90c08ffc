//! Authenticated session context.
//!
//! A [`Session`] only comes into existence through a successful login and is
//! consumed by logout. Components borrow it read-only; there is no global
//! "current user".

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::User;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    user: User,
    cookie: String,
    established_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(user: User, cookie: String) -> Self {
        Self {
            user,
            cookie,
            established_at: Utc::now(),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Value for the `Cookie` request header.
    pub(crate) fn cookie(&self) -> &str {
        &self.cookie
    }
}

/// Reduce `Set-Cookie` header values to a single `Cookie` header value,
/// keeping only the `name=value` pair of each.
pub(crate) fn cookie_header<'a, I>(set_cookies: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let pairs: Vec<&str> = set_cookies
        .into_iter()
        .filter_map(|raw| raw.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('=') && !pair.starts_with('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// Keeps the session on disk between CLI invocations.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<Session>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let session: Session = serde_json::from_slice(&bytes)?;
                debug!(user = %session.user.user_name, "restored session");
                Ok(Some(session))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, bytes).await?;
        info!(path = %self.path.display(), "session saved");
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
