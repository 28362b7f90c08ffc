use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::api::{ApiClient, Center, ClassificationResult, Submission};
use crate::busy::BusyFlag;
use crate::capture::{capture_from_camera, capture_from_file, Camera, Capture, ImageBlob, PreviewHandle};
use crate::classify::ClassificationPreview;
use crate::error::{Result, ValidationError};
use crate::session::Session;

pub const SUBMIT_FAILED: &str = "Failed to submit. Try again.";
pub const SUBMIT_SAVED: &str = "Submission saved! Status: Not verified.";
pub const CENTERS_UNAVAILABLE: &str = "Could not load collection centers.";

/// A submission that passed every client-side check.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionDraft<'a> {
    pub session: &'a Session,
    pub image: &'a ImageBlob,
    pub weight_kg: f64,
    pub centre_id: i64,
}

/// Check the submission preconditions in order, reporting only the first
/// one that fails: image, classification, weight, center, session.
pub fn validate_submission<'a>(
    selected: Option<&'a Capture>,
    classification: Option<&ClassificationResult>,
    weight: &str,
    collection_center: &str,
    session: Option<&'a Session>,
) -> std::result::Result<SubmissionDraft<'a>, ValidationError> {
    let capture = selected.ok_or(ValidationError::NoFileSelected)?;
    if classification.is_none() {
        return Err(ValidationError::MissingClassification);
    }

    let weight = weight.trim();
    if weight.is_empty() {
        return Err(ValidationError::MissingWeight);
    }
    let weight_kg: f64 = weight.parse().map_err(|_| ValidationError::InvalidWeight)?;
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(ValidationError::InvalidWeight);
    }

    let centre_id: i64 = collection_center
        .trim()
        .parse()
        .map_err(|_| ValidationError::MissingCenter)?;

    let session = session.ok_or(ValidationError::NotAuthenticated)?;

    Ok(SubmissionDraft {
        session,
        image: &capture.image,
        weight_kg,
        centre_id,
    })
}

/// Transient state of one upload interaction: capture, preview, then submit.
pub struct UploadForm {
    selected: Option<Capture>,
    weight: String,
    collection_center: String,
    preview: ClassificationPreview,
    centers: Vec<Center>,
    submitting: BusyFlag,
    error: Option<String>,
    notice: Option<String>,
}

impl UploadForm {
    pub fn new(status_interval: Duration) -> Self {
        Self {
            selected: None,
            weight: String::new(),
            collection_center: String::new(),
            preview: ClassificationPreview::new(status_interval),
            centers: Vec::new(),
            submitting: BusyFlag::new(),
            error: None,
            notice: None,
        }
    }

    pub fn selected(&self) -> Option<&Capture> {
        self.selected.as_ref()
    }

    pub fn preview_handle(&self) -> Option<&PreviewHandle> {
        self.selected.as_ref().map(|c| &c.preview)
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.preview.result()
    }

    pub fn preview(&self) -> &ClassificationPreview {
        &self.preview
    }

    pub fn weight(&self) -> &str {
        &self.weight
    }

    pub fn collection_center(&self) -> &str {
        &self.collection_center
    }

    pub fn centers(&self) -> &[Center] {
        &self.centers
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_set()
    }

    /// The submit action is only offered once a classification exists.
    pub fn can_submit(&self) -> bool {
        self.classification().is_some() && !self.is_submitting()
    }

    pub fn set_weight(&mut self, weight: impl Into<String>) {
        self.weight = weight.into();
    }

    pub fn set_collection_center(&mut self, centre_id: impl Into<String>) {
        self.collection_center = centre_id.into();
    }

    /// Populate the center selection. A failure leaves the list empty and
    /// the rest of the form usable.
    pub async fn load_centers(&mut self, api: &ApiClient, session: Option<&Session>) {
        match api.list_centers(session).await {
            Ok(centers) => {
                info!(count = centers.len(), "collection centers loaded");
                self.centers = centers;
            }
            Err(e) => {
                warn!(error = %e, "collection centers unavailable");
                self.centers.clear();
                self.error = Some(CENTERS_UNAVAILABLE.to_string());
            }
        }
    }

    /// Pick an image file and classify it straight away.
    pub async fn select_file(
        &mut self,
        api: &ApiClient,
        session: Option<&Session>,
        path: Option<&Path>,
    ) -> Result<ClassificationResult> {
        match capture_from_file(path).await {
            Ok(capture) => self.accept_capture(api, session, capture).await,
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Snapshot the camera and classify the frame straight away.
    pub async fn take_photo<C: Camera>(
        &mut self,
        api: &ApiClient,
        session: Option<&Session>,
        camera: &C,
        settle: Duration,
    ) -> Result<ClassificationResult> {
        match capture_from_camera(camera, settle).await {
            Ok(capture) => self.accept_capture(api, session, capture).await,
            Err(e) => {
                warn!(error = ?e, "camera capture failed");
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    async fn accept_capture(
        &mut self,
        api: &ApiClient,
        session: Option<&Session>,
        capture: Capture,
    ) -> Result<ClassificationResult> {
        self.error = None;
        self.notice = None;
        let capture = self.selected.insert(capture);
        let outcome = self.preview.classify(api, session, &capture.image).await;
        if outcome.is_err() {
            self.error = self.preview.error().map(str::to_string);
        }
        outcome
    }

    pub fn validate<'a>(
        &'a self,
        session: Option<&'a Session>,
    ) -> std::result::Result<SubmissionDraft<'a>, ValidationError> {
        validate_submission(
            self.selected.as_ref(),
            self.preview.result(),
            &self.weight,
            &self.collection_center,
            session,
        )
    }

    /// Send the authoritative submission.
    ///
    /// Validation failures never touch the network. On success the form is
    /// reset; on failure it is kept as-is so the user can retry.
    pub async fn submit(
        &mut self,
        api: &ApiClient,
        session: Option<&Session>,
    ) -> Result<Submission> {
        let Some(_submitting) = self.submitting.try_raise() else {
            return Err(ValidationError::AlreadySubmitting.into());
        };

        let draft = match validate_submission(
            self.selected.as_ref(),
            self.preview.result(),
            &self.weight,
            &self.collection_center,
            session,
        ) {
            Ok(draft) => draft,
            Err(e) => {
                info!(reason = %e, "submission blocked by validation");
                self.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let outcome = api
            .create_upload(draft.session, draft.image, draft.weight_kg, draft.centre_id)
            .await;

        match outcome {
            Ok(submission) => {
                self.reset();
                self.notice = Some(SUBMIT_SAVED.to_string());
                Ok(submission)
            }
            Err(e) => {
                self.error = Some(e.user_message(SUBMIT_FAILED));
                Err(e)
            }
        }
    }

    /// Drop the image, classification, weight and center. The loaded center
    /// list stays.
    pub fn reset(&mut self) {
        self.selected = None;
        self.preview.clear();
        self.weight.clear();
        self.collection_center.clear();
        self.error = None;
    }
}
