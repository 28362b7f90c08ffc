//! A user's own submissions with client-side filtering, stats and paging.
//!
//! Everything here is derived from one `GET /uploads/`; no filter or page
//! parameter is ever sent to the backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::api::{ApiClient, Submission};
use crate::error::Result;
use crate::session::Session;

pub const HISTORY_FAILED: &str = "Failed to load submission history.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Verified,
}

impl StatusFilter {
    fn admits(self, upload: &Submission) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => upload.not_verified,
            StatusFilter::Verified => !upload.not_verified,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "verified" => Ok(StatusFilter::Verified),
            other => Err(format!("unknown status filter {:?} (all|pending|verified)", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    fn admits(&self, upload: &Submission) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => upload.category.as_deref() == Some(category.as_str()),
        }
    }
}

impl From<Option<String>> for CategoryFilter {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(c) if c != "all" => CategoryFilter::Only(c),
            _ => CategoryFilter::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFilters {
    pub status: StatusFilter,
    pub category: CategoryFilter,
    /// 1-based.
    pub page: usize,
    pub limit: usize,
}

impl Default for HistoryFilters {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            category: CategoryFilter::All,
            page: 1,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryStatus {
    Pending,
    Verified,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryStatus::Pending => "Pending",
            EntryStatus::Verified => "Verified",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub category: String,
    pub center: Option<i64>,
    pub weight_kg: f64,
    pub status: EntryStatus,
    /// Zero until verified, whatever the backend reports.
    pub points: i64,
    pub date: Option<DateTime<Utc>>,
    pub not_verified: bool,
}

impl From<&Submission> for HistoryEntry {
    fn from(u: &Submission) -> Self {
        Self {
            id: u.id,
            category: u
                .category
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            center: u.centre_id,
            weight_kg: u.weight.filter(|w| w.is_finite()).unwrap_or(0.0),
            status: if u.not_verified {
                EntryStatus::Pending
            } else {
                EntryStatus::Verified
            },
            points: if u.not_verified { 0 } else { u.points() },
            date: u.upload_date,
            not_verified: u.not_verified,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total_weight: f64,
    pub total_points: i64,
    pub verified_count: usize,
}

impl HistoryStats {
    /// Only verified entries count.
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        entries
            .iter()
            .filter(|e| !e.not_verified)
            .fold(Self::default(), |acc, e| Self {
                total_weight: acc.total_weight + e.weight_kg,
                total_points: acc.total_points + e.points,
                verified_count: acc.verified_count + 1,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let limit = limit.max(1);
        Self {
            page: page.max(1),
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    pub items: Vec<HistoryEntry>,
    pub stats: HistoryStats,
    pub pagination: Pagination,
}

impl HistoryView {
    /// Entries on the requested page; empty past the last page.
    pub fn page_items(&self) -> &[HistoryEntry] {
        let start = self
            .pagination
            .page
            .saturating_sub(1)
            .saturating_mul(self.pagination.limit);
        if start >= self.items.len() {
            return &[];
        }
        let end = (start + self.pagination.limit).min(self.items.len());
        &self.items[start..end]
    }
}

/// Filter, map and summarise an already fetched upload list.
pub fn reconcile(uploads: &[Submission], filters: &HistoryFilters) -> HistoryView {
    let items: Vec<HistoryEntry> = uploads
        .iter()
        .filter(|u| filters.status.admits(u))
        .filter(|u| filters.category.admits(u))
        .map(HistoryEntry::from)
        .collect();

    let stats = HistoryStats::from_entries(&items);
    let pagination = Pagination::new(filters.page, filters.limit, items.len());
    HistoryView {
        items,
        stats,
        pagination,
    }
}

pub async fn load(
    api: &ApiClient,
    session: &Session,
    filters: &HistoryFilters,
) -> Result<HistoryView> {
    let uploads = api.list_uploads(session).await?;
    let view = reconcile(&uploads, filters);
    debug!(
        fetched = uploads.len(),
        shown = view.items.len(),
        verified = view.stats.verified_count,
        "history reconciled"
    );
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(id: i64, category: &str, weight: f64, not_verified: bool, points: i64) -> Submission {
        Submission {
            id,
            user_id: Some(3),
            user_name: None,
            centre_id: Some(2),
            category: Some(category.into()),
            confidence: None,
            weight: Some(weight),
            points_awarded: Some(points),
            not_verified,
            upload_date: None,
        }
    }

    fn mixed() -> Vec<Submission> {
        vec![
            upload(1, "plastic", 2.0, false, 10),
            upload(2, "glass", 3.0, true, 99),
            upload(3, "plastic", 1.5, true, 0),
            upload(4, "metal", 4.0, false, 25),
        ]
    }

    #[test]
    fn stats_only_count_verified_items() {
        let uploads = vec![upload(1, "plastic", 2.0, false, 10), upload(2, "glass", 3.0, true, 99)];
        let view = reconcile(&uploads, &HistoryFilters::default());
        assert_eq!(view.stats.total_weight, 2.0);
        assert_eq!(view.stats.total_points, 10);
        assert_eq!(view.stats.verified_count, 1);
        assert_eq!(view.items[1].points, 0);
    }

    #[test]
    fn pending_filter_returns_exactly_unverified() {
        let filters = HistoryFilters {
            status: StatusFilter::Pending,
            ..HistoryFilters::default()
        };
        let view = reconcile(&mixed(), &filters);
        let ids: Vec<i64> = view.items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(view.items.iter().all(|e| e.not_verified));
    }

    #[test]
    fn verified_filter_is_the_complement() {
        let filters = HistoryFilters {
            status: StatusFilter::Verified,
            ..HistoryFilters::default()
        };
        let ids: Vec<i64> = reconcile(&mixed(), &filters).items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn all_filter_leaves_set_unchanged() {
        let uploads = mixed();
        let view = reconcile(&uploads, &HistoryFilters::default());
        let expected: Vec<HistoryEntry> = uploads.iter().map(HistoryEntry::from).collect();
        assert_eq!(view.items, expected);
    }

    #[test]
    fn category_filter_combines_with_status() {
        let filters = HistoryFilters {
            status: StatusFilter::Pending,
            category: CategoryFilter::Only("plastic".into()),
            ..HistoryFilters::default()
        };
        let view = reconcile(&mixed(), &filters);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].id, 3);
        assert_eq!(view.stats.verified_count, 0);
    }

    #[test]
    fn pagination_uses_ceiling_of_filtered_count() {
        let uploads: Vec<Submission> = (1..=23).map(|i| upload(i, "paper", 1.0, true, 0)).collect();
        let filters = HistoryFilters {
            page: 3,
            limit: 10,
            ..HistoryFilters::default()
        };
        let view = reconcile(&uploads, &filters);
        assert_eq!(view.pagination.total, 23);
        assert_eq!(view.pagination.total_pages, 3);
        assert_eq!(view.page_items().len(), 3);
        assert_eq!(view.page_items()[0].id, 21);
    }

    #[test]
    fn empty_and_out_of_range_pages() {
        let view = reconcile(&[], &HistoryFilters::default());
        assert_eq!(view.pagination.total_pages, 0);
        assert!(view.page_items().is_empty());

        let filters = HistoryFilters {
            page: 9,
            limit: 0,
            ..HistoryFilters::default()
        };
        let view = reconcile(&mixed(), &filters);
        assert_eq!(view.pagination.limit, 1);
        assert_eq!(view.pagination.total_pages, 4);
        assert!(view.page_items().is_empty());
    }

    #[test]
    fn hand_built_page_zero_reads_as_first_page() {
        let mut view = reconcile(&mixed(), &HistoryFilters::default());
        view.pagination.page = 0;
        assert_eq!(view.page_items().len(), 4);
    }

    #[test]
    fn missing_fields_map_to_display_defaults() {
        let mut raw = upload(8, "", 0.0, false, 0);
        raw.category = None;
        raw.weight = None;
        raw.points_awarded = None;
        let entry = HistoryEntry::from(&raw);
        assert_eq!(entry.category, "Unknown");
        assert_eq!(entry.weight_kg, 0.0);
        assert_eq!(entry.points, 0);
        assert_eq!(entry.status, EntryStatus::Verified);
    }

    #[test]
    fn status_filter_parses_case_insensitively() {
        assert_eq!("Pending".parse::<StatusFilter>().unwrap(), StatusFilter::Pending);
        assert!("done".parse::<StatusFilter>().is_err());
        assert_eq!(CategoryFilter::from(Some("all".to_string())), CategoryFilter::All);
    }
}
