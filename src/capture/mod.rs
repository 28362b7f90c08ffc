mod camera;

pub use camera::{
    capture_from_camera, Camera, CameraStream, CommandCamera, CommandStream, Facing, StreamGuard,
};

use std::fmt;
use std::path::Path;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CaptureError;

/// An image ready to be sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlob {
    bytes: Vec<u8>,
    file_name: String,
    mime: String,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime: mime.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Local reference used to show the captured image before it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn generate() -> Self {
        Self(format!("blob:eco-collect/{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub image: ImageBlob,
    pub preview: PreviewHandle,
}

impl Capture {
    pub fn new(image: ImageBlob) -> Self {
        Self {
            image,
            preview: PreviewHandle::generate(),
        }
    }
}

/// Take a user-chosen image file. `None` means the picker was dismissed.
pub async fn capture_from_file(path: Option<&Path>) -> Result<Capture, CaptureError> {
    let path = path.ok_or(CaptureError::NoFileSelected)?;

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(CaptureError::UnsupportedFileType(mime.essence_str().to_string()));
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "selected file does not exist");
            return Err(CaptureError::NoFileSelected);
        }
        Err(e) => return Err(e.into()),
    };
    if bytes.is_empty() {
        debug!(path = %path.display(), "selected file is empty");
        return Err(CaptureError::NoFileSelected);
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.jpg")
        .to_string();

    info!(file = %file_name, bytes = bytes.len(), mime = %mime, "captured image from file");
    Ok(Capture::new(ImageBlob::new(bytes, file_name, mime.essence_str())))
}
