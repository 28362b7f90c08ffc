mod preview;
mod status;

pub use preview::{ClassificationPreview, PREVIEW_FAILED};
pub use status::{StatusBoard, StatusLine, StatusTicker, STATUS_MESSAGES};
