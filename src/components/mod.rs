pub mod history;
pub mod upload;
pub mod verification;

pub use history::{HistoryFilters, HistoryView, StatusFilter};
pub use upload::UploadForm;
pub use verification::{mark_verified, CenterDirectory, VerificationReview};
