use serde::{Deserialize, Serialize};

use super::domain::{SubmissionListing, VerificationStatus};

/// Row cap applied to every listing read.
pub const DEFAULT_LIST_LIMIT: usize = 200;

/// Status tabs offered by the moderation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    Pending,
    Approved,
    /// Rejected rows are deleted, so this tab is always empty.
    Rejected,
    Flagged,
    All,
}

impl StatusFilter {
    pub const TABS: [StatusFilter; 4] = [
        StatusFilter::Pending,
        StatusFilter::Approved,
        StatusFilter::Rejected,
        StatusFilter::All,
    ];

    pub fn matches(self, status: Option<VerificationStatus>) -> bool {
        match self {
            StatusFilter::Pending => matches!(status, None | Some(VerificationStatus::Pending)),
            StatusFilter::Approved => status == Some(VerificationStatus::Approved),
            StatusFilter::Flagged => status == Some(VerificationStatus::Flagged),
            StatusFilter::Rejected => false,
            StatusFilter::All => true,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "flagged" => Some(Self::Flagged),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Listing request: status tab, free-text search, and row cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionQuery {
    pub status: StatusFilter,
    pub search: Option<String>,
    pub limit: usize,
}

impl Default for SubmissionQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::default(),
            search: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl SubmissionQuery {
    pub fn new(status: StatusFilter) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search)
        };
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Case-insensitive match across job type, postcode district, submitter name, and description.
    pub fn matches_search(&self, listing: &SubmissionListing) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => needle.to_lowercase(),
            _ => return true,
        };

        let submission = &listing.submission;
        [
            Some(submission.job_type.as_str()),
            submission.postcode_district.as_deref(),
            listing.submitter_name.as_deref(),
            submission.job_description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn matches(&self, listing: &SubmissionListing) -> bool {
        self.status
            .matches(listing.submission.verification_status)
            && self.matches_search(listing)
    }
}
