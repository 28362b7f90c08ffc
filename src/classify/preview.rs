use std::time::Duration;

use tracing::{info, warn};

use super::status::StatusBoard;
use crate::api::{ApiClient, ClassificationResult};
use crate::busy::BusyFlag;
use crate::capture::ImageBlob;
use crate::error::Result;
use crate::session::Session;

pub const PREVIEW_FAILED: &str = "Failed to analyze image. Try again.";

/// Classification preview state for one upload form.
///
/// A preview asks the backend to classify an image without storing anything.
/// Taking `&mut self` means a single preview is in flight per form; starting
/// the next one supersedes whatever the previous left behind.
pub struct ClassificationPreview {
    status_interval: Duration,
    board: StatusBoard,
    in_flight: BusyFlag,
    result: Option<ClassificationResult>,
    error: Option<String>,
}

impl ClassificationPreview {
    pub fn new(status_interval: Duration) -> Self {
        Self {
            status_interval,
            board: StatusBoard::new(),
            in_flight: BusyFlag::new(),
            result: None,
            error: None,
        }
    }

    /// Rotating status text, for views that want to render it.
    pub fn status(&self) -> &StatusBoard {
        &self.board
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_set()
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear(&mut self) {
        self.result = None;
        self.error = None;
    }

    /// Send `image` for a preview classification.
    ///
    /// Exactly one request goes out. The in-flight flag and the status ticker
    /// are both owned by guards local to this call, so they are released on
    /// success, failure, and if the future is dropped mid-request.
    pub async fn classify(
        &mut self,
        api: &ApiClient,
        session: Option<&Session>,
        image: &ImageBlob,
    ) -> Result<ClassificationResult> {
        self.clear();

        let _busy = self.in_flight.try_raise();
        let _ticker = self.board.start_ticker(self.status_interval);

        match api.preview_upload(session, image).await {
            Ok(result) => {
                info!(
                    category = %result.category,
                    confidence = ?result.confidence,
                    "preview classification complete"
                );
                self.result = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                let message = e.user_message(PREVIEW_FAILED);
                warn!(error = %e, "preview classification failed");
                self.error = Some(message);
                Err(e)
            }
        }
    }
}
