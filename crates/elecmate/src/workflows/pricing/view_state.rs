use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{PricingSubmission, RejectionReason, RejectionRequest, SubmissionId};
use super::query::{StatusFilter, SubmissionQuery};

/// Moderation action currently awaiting a store response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationActionKind {
    Approve,
    Flag,
    Reject,
}

/// Events emitted by the moderation screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum ViewEvent {
    SearchChanged(String),
    TabSelected(StatusFilter),
    SubmissionOpened(SubmissionId),
    DetailClosed,
    RejectDialogOpened,
    RejectDialogClosed,
    ReasonToggled(RejectionReason),
    OtherTextChanged(String),
    ActionStarted(ModerationActionKind),
    ActionSucceeded,
    ActionFailed,
}

/// Filter, selection, and dialog state owned by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModerationViewState {
    pub search: String,
    pub tab: StatusFilter,
    pub selected: Option<SubmissionId>,
    pub detail_open: bool,
    pub reject_dialog_open: bool,
    pub reject_reasons: BTreeSet<RejectionReason>,
    pub other_text: String,
    pub in_flight: Option<ModerationActionKind>,
}

impl ModerationViewState {
    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::SearchChanged(search) => self.search = search,
            ViewEvent::TabSelected(tab) => self.tab = tab,
            ViewEvent::SubmissionOpened(id) => {
                if self.selected != Some(id) {
                    self.reset_rejection();
                }
                self.selected = Some(id);
                self.detail_open = true;
            }
            ViewEvent::DetailClosed => {
                self.detail_open = false;
                self.reject_dialog_open = false;
            }
            ViewEvent::RejectDialogOpened => {
                if self.selected.is_some() {
                    self.reject_dialog_open = true;
                }
            }
            ViewEvent::RejectDialogClosed => {
                self.reject_dialog_open = false;
                self.reset_rejection();
            }
            ViewEvent::ReasonToggled(reason) => {
                if !self.reject_reasons.remove(&reason) {
                    self.reject_reasons.insert(reason);
                }
            }
            ViewEvent::OtherTextChanged(text) => self.other_text = text,
            ViewEvent::ActionStarted(kind) => self.in_flight = Some(kind),
            ViewEvent::ActionSucceeded => {
                self.in_flight = None;
                self.selected = None;
                self.detail_open = false;
                self.reject_dialog_open = false;
                self.reset_rejection();
            }
            // Keep selection, dialog, and reasons so the admin can retry.
            ViewEvent::ActionFailed => self.in_flight = None,
        }
    }

    /// Listing query for the active tab and search text.
    pub fn query(&self, limit: usize) -> SubmissionQuery {
        SubmissionQuery::new(self.tab)
            .with_search(self.search.clone())
            .with_limit(limit)
    }

    /// Approve, flag, and reject are only offered for submissions awaiting review and
    /// stay disabled while another action is in flight.
    pub fn actions_enabled(&self, submission: &PricingSubmission) -> bool {
        self.in_flight.is_none()
            && self.selected == Some(submission.id)
            && submission.awaiting_review()
    }

    pub fn can_submit_rejection(&self) -> bool {
        self.in_flight.is_none() && self.selected.is_some() && !self.reject_reasons.is_empty()
    }

    /// Request built from the dialog, or `None` while it cannot be submitted.
    pub fn rejection_request(&self) -> Option<(SubmissionId, RejectionRequest)> {
        if !self.can_submit_rejection() {
            return None;
        }
        let id = self.selected?;
        let other_text = Some(self.other_text.trim())
            .filter(|text| !text.is_empty() && self.reject_reasons.contains(&RejectionReason::Other))
            .map(str::to_string);

        Some((
            id,
            RejectionRequest {
                reasons: self.reject_reasons.iter().copied().collect(),
                other_text,
            },
        ))
    }

    fn reset_rejection(&mut self) {
        self.reject_reasons.clear();
        self.other_text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::pricing::domain::VerificationStatus;
    use chrono::Utc;

    fn opened(submission: &PricingSubmission) -> ModerationViewState {
        let mut state = ModerationViewState::default();
        state.apply(ViewEvent::SubmissionOpened(submission.id));
        state
    }

    #[test]
    fn rejection_requires_a_reason() {
        let submission = PricingSubmission::new("EICR", 180.0, Utc::now());
        let mut state = opened(&submission);
        state.apply(ViewEvent::RejectDialogOpened);
        assert!(state.reject_dialog_open);
        assert!(!state.can_submit_rejection());
        assert!(state.rejection_request().is_none());

        state.apply(ViewEvent::ReasonToggled(RejectionReason::Spam));
        let (id, request) = state.rejection_request().expect("request available");
        assert_eq!(id, submission.id);
        assert_eq!(request.reasons, vec![RejectionReason::Spam]);
        assert!(request.other_text.is_none());

        state.apply(ViewEvent::ReasonToggled(RejectionReason::Spam));
        assert!(!state.can_submit_rejection());
    }

    #[test]
    fn other_text_is_only_sent_with_other_reason() {
        let submission = PricingSubmission::new("EICR", 180.0, Utc::now());
        let mut state = opened(&submission);
        state.apply(ViewEvent::ReasonToggled(RejectionReason::Duplicate));
        state.apply(ViewEvent::OtherTextChanged("  same as last week ".to_string()));
        let (_, request) = state.rejection_request().expect("request available");
        assert!(request.other_text.is_none());

        state.apply(ViewEvent::ReasonToggled(RejectionReason::Other));
        let (_, request) = state.rejection_request().expect("request available");
        assert_eq!(request.other_text.as_deref(), Some("same as last week"));
        assert_eq!(
            request.reasons,
            vec![RejectionReason::Duplicate, RejectionReason::Other]
        );
    }

    #[test]
    fn failure_preserves_selection_and_dialog() {
        let submission = PricingSubmission::new("EICR", 180.0, Utc::now());
        let mut state = opened(&submission);
        state.apply(ViewEvent::RejectDialogOpened);
        state.apply(ViewEvent::ReasonToggled(RejectionReason::Incomplete));
        state.apply(ViewEvent::ActionStarted(ModerationActionKind::Reject));
        assert!(!state.actions_enabled(&submission));
        assert!(!state.can_submit_rejection());

        state.apply(ViewEvent::ActionFailed);
        assert_eq!(state.selected, Some(submission.id));
        assert!(state.reject_dialog_open);
        assert!(state.reject_reasons.contains(&RejectionReason::Incomplete));
        assert!(state.can_submit_rejection());
    }

    #[test]
    fn success_clears_selection() {
        let submission = PricingSubmission::new("EICR", 180.0, Utc::now());
        let mut state = opened(&submission);
        state.apply(ViewEvent::ActionStarted(ModerationActionKind::Approve));
        state.apply(ViewEvent::ActionSucceeded);
        assert_eq!(state, ModerationViewState::default());
    }

    #[test]
    fn reviewed_submissions_offer_no_actions() {
        let mut submission = PricingSubmission::new("EICR", 180.0, Utc::now());
        submission.verification_status = Some(VerificationStatus::Flagged);
        let state = opened(&submission);
        assert!(!state.actions_enabled(&submission));
    }

    #[test]
    fn query_follows_tab_and_search() {
        let mut state = ModerationViewState::default();
        state.apply(ViewEvent::TabSelected(StatusFilter::Approved));
        state.apply(ViewEvent::SearchChanged("SW1A".to_string()));
        let query = state.query(50);
        assert_eq!(query.status, StatusFilter::Approved);
        assert_eq!(query.search.as_deref(), Some("SW1A"));
        assert_eq!(query.limit, 50);
    }

    #[test]
    fn state_round_trips_through_json() {
        let submission = PricingSubmission::new("EICR", 180.0, Utc::now());
        let mut state = opened(&submission);
        state.apply(ViewEvent::ReasonToggled(RejectionReason::Unrealistic));
        let json = serde_json::to_string(&state).expect("serializes");
        let restored: ModerationViewState = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(restored, state);
    }
}
