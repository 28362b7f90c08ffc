use thiserror::Error;

/// Client-side precondition failures. These never reach the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a file.")]
    NoFileSelected,

    #[error("Wait for the AI analysis before submitting.")]
    MissingClassification,

    #[error("Enter weight.")]
    MissingWeight,

    #[error("Weight must be a positive number of kilograms.")]
    InvalidWeight,

    #[error("Select collection center.")]
    MissingCenter,

    #[error("You must be logged in to submit.")]
    NotAuthenticated,

    #[error("A submission is already in progress.")]
    AlreadySubmitting,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Stream acquisition was denied or no device exists.
    #[error("Camera not available.")]
    CameraUnavailable { reason: String },

    #[error("Camera snapshot failed: {0}")]
    SnapshotFailed(String),

    #[error("Could not read image: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session store error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Collapse any failure into the single message shown to the user.
    ///
    /// Validation and capture errors carry their own text. Server errors use
    /// the message extracted from the response body when there was one;
    /// everything else falls back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Validation(e) => e.to_string(),
            Error::Capture(e) => e.to_string(),
            Error::Server {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Pull a human readable message out of an error response body.
///
/// The backend answers failures with `{"error": ...}` and sometimes adds a
/// `message`; `error` wins when both are present.
pub fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
