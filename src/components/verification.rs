use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::{ApiClient, Center, Submission};
use crate::error::Result;
use crate::session::Session;

pub const UPLOADS_FAILED: &str = "Failed to fetch uploads";
pub const APPROVE_FAILED: &str = "Failed to verify upload";
pub const UNKNOWN: &str = "Unknown";

/// Center id to display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CenterDirectory(HashMap<i64, String>);

impl CenterDirectory {
    pub fn from_centers(centers: &[Center]) -> Self {
        Self(
            centers
                .iter()
                .map(|c| {
                    let name = c
                        .name
                        .as_deref()
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or(UNKNOWN);
                    (c.id, name.to_string())
                })
                .collect(),
        )
    }

    pub fn name(&self, id: Option<i64>) -> &str {
        id.and_then(|id| self.0.get(&id))
            .map(String::as_str)
            .unwrap_or(UNKNOWN)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reflect a confirmed approval locally: only the matching entry's
/// `not_verified` flips; points and every other entry stay as they were.
pub fn mark_verified(uploads: Vec<Submission>, id: i64) -> Vec<Submission> {
    uploads
        .into_iter()
        .map(|mut u| {
            if u.id == id {
                u.not_verified = false;
            }
            u
        })
        .collect()
}

/// One row of the verification screen.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationCard {
    pub id: i64,
    pub user: String,
    pub center: String,
    pub category: String,
    pub weight_kg: Option<f64>,
    pub points: i64,
    pub uploaded: Option<String>,
    pub verified: bool,
}

/// Corporate review of every submission, pending and already verified.
#[derive(Debug, Clone, Default)]
pub struct VerificationReview {
    uploads: Vec<Submission>,
    centers: CenterDirectory,
    error: Option<String>,
}

impl VerificationReview {
    pub fn from_parts(uploads: Vec<Submission>, centers: CenterDirectory) -> Self {
        Self {
            uploads,
            centers,
            error: None,
        }
    }

    /// Fetch submissions and centers side by side. Losing the centers only
    /// costs the names; losing the submissions is an error.
    pub async fn load(api: &ApiClient, session: Option<&Session>) -> Result<Self> {
        let (uploads, centers) = tokio::join!(
            api.list_all_uploads(session),
            api.list_centers(session)
        );

        let centers = match centers {
            Ok(centers) => CenterDirectory::from_centers(&centers),
            Err(e) => {
                warn!(error = %e, "center lookup unavailable, names will show as Unknown");
                CenterDirectory::default()
            }
        };

        let uploads = uploads?;
        info!(
            total = uploads.len(),
            pending = uploads.iter().filter(|u| u.not_verified).count(),
            "verification list loaded"
        );
        Ok(Self::from_parts(uploads, centers))
    }

    pub fn uploads(&self) -> &[Submission] {
        &self.uploads
    }

    pub fn centers(&self) -> &CenterDirectory {
        &self.centers
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending_count(&self) -> usize {
        self.uploads.iter().filter(|u| u.not_verified).count()
    }

    pub fn cards(&self) -> Vec<VerificationCard> {
        self.uploads
            .iter()
            .map(|u| VerificationCard {
                id: u.id,
                user: u
                    .user_name
                    .clone()
                    .or_else(|| u.user_id.map(|id| id.to_string()))
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                center: self.centers.name(u.centre_id).to_string(),
                category: u
                    .category
                    .clone()
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                weight_kg: u.weight,
                points: u.points(),
                uploaded: u
                    .upload_date
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string()),
                verified: u.is_verified(),
            })
            .collect()
    }

    /// Approve one submission. Local state changes only after the backend
    /// confirms; on failure nothing is touched.
    pub async fn approve(
        &mut self,
        api: &ApiClient,
        session: Option<&Session>,
        id: i64,
    ) -> Result<()> {
        match api.approve_upload(session, id).await {
            Ok(()) => {
                self.uploads = mark_verified(std::mem::take(&mut self.uploads), id);
                self.error = None;
                info!(id, "upload verified");
                Ok(())
            }
            Err(e) => {
                warn!(id, error = %e, "approval failed");
                self.error = Some(e.user_message(APPROVE_FAILED));
                Err(e)
            }
        }
    }
}
