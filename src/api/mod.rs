//! HTTP access to the Eco-Collect backend.
//!
//! The backend owns every record; this client only moves them back and forth.

mod models;

pub use models::*;

use std::time::Duration;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::capture::ImageBlob;
use crate::error::{server_message, Error, Result};
use crate::session::{cookie_header, Session};

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match session {
            Some(s) => builder.header(COOKIE, s.cookie()),
            None => builder,
        }
    }

    /// Send and return the body of a successful response; any other status
    /// becomes `Error::Server` carrying the body's message.
    async fn send(&self, builder: RequestBuilder) -> Result<String> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = server_message(&text);
            warn!(status = status.as_u16(), message = ?message, "backend rejected request");
            return Err(Error::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(text)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let text = self.send(builder).await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn image_part(image: &ImageBlob) -> Result<Part> {
        Ok(Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.mime())?)
    }

    // ── Session ──

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        info!(email = %email, "logging in");
        let response = self
            .request(Method::POST, "/auth/login", None)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        let cookie = cookie_header(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Server {
                status: status.as_u16(),
                message: server_message(&text),
            });
        }

        let envelope: UserEnvelope = serde_json::from_str(&text)?;
        let missing = |what: &str| Error::Server {
            status: status.as_u16(),
            message: Some(format!("Login response did not include {}", what)),
        };
        let user = envelope.user.ok_or_else(|| missing("a user"))?;
        let cookie = cookie.ok_or_else(|| missing("a session cookie"))?;

        info!(user = %user.user_name, role = ?user.role, "session established");
        Ok(Session::new(user, cookie))
    }

    /// End the session server-side. The session is consumed either way.
    pub async fn logout(&self, session: Session) -> Result<()> {
        info!(user = %session.user().user_name, "logging out");
        self.send(self.request(Method::POST, "/auth/logout", Some(&session)))
            .await?;
        Ok(())
    }

    /// `None` when the backend no longer recognises the session.
    pub async fn current_user(&self, session: &Session) -> Result<Option<User>> {
        let envelope: UserEnvelope = self
            .send_json(self.request(Method::GET, "/auth/me", Some(session)))
            .await?;
        Ok(envelope.user)
    }

    // ── Uploads ──

    /// Classify `image` without persisting anything.
    pub async fn preview_upload(
        &self,
        session: Option<&Session>,
        image: &ImageBlob,
    ) -> Result<ClassificationResult> {
        debug!(file = %image.file_name(), bytes = image.len(), "requesting preview classification");
        let form = Form::new()
            .part("file", Self::image_part(image)?)
            .text("preview", "true");

        let envelope: PreviewEnvelope = self
            .send_json(
                self.request(Method::POST, "/uploads/", session)
                    .multipart(form),
            )
            .await?;
        Ok(envelope.upload.unwrap_or_default().into())
    }

    /// Create the durable submission record.
    pub async fn create_upload(
        &self,
        session: &Session,
        image: &ImageBlob,
        weight_kg: f64,
        centre_id: i64,
    ) -> Result<Submission> {
        info!(
            file = %image.file_name(),
            weight_kg,
            centre_id,
            "submitting upload"
        );
        let form = Form::new()
            .part("file", Self::image_part(image)?)
            .text("weight", weight_kg.to_string())
            .text("centre_id", centre_id.to_string());

        let envelope: CreatedEnvelope = self
            .send_json(
                self.request(Method::POST, "/uploads/", Some(session))
                    .multipart(form),
            )
            .await?;
        info!(id = envelope.upload.id, "upload saved");
        Ok(envelope.upload)
    }

    /// The signed-in user's own submissions, newest first.
    pub async fn list_uploads(&self, session: &Session) -> Result<Vec<Submission>> {
        let envelope: UploadsEnvelope = self
            .send_json(self.request(Method::GET, "/uploads/", Some(session)))
            .await?;
        debug!(count = envelope.uploads.len(), "fetched own uploads");
        Ok(envelope.uploads)
    }

    /// Every submission, verified or not, newest first.
    pub async fn list_all_uploads(&self, session: Option<&Session>) -> Result<Vec<Submission>> {
        let envelope: UploadsEnvelope = self
            .send_json(self.request(Method::GET, "/uploads/all", session))
            .await?;
        debug!(count = envelope.uploads.len(), "fetched all uploads");
        Ok(envelope.uploads)
    }

    pub async fn approve_upload(&self, session: Option<&Session>, id: i64) -> Result<()> {
        info!(id, "approving upload");
        self.send(self.request(Method::PATCH, &format!("/uploads/approve/{}", id), session))
            .await?;
        Ok(())
    }

    // ── Centers ──

    pub async fn list_centers(&self, session: Option<&Session>) -> Result<Vec<Center>> {
        let centers: Vec<Center> = self
            .send_json(self.request(Method::GET, "/api/centers/", session))
            .await?;
        debug!(count = centers.len(), "fetched centers");
        Ok(centers)
    }
}
