//! Project lifecycle states and the transition table.
//!
//! # Responsibility
//! - Define the closed set of project states and lifecycle actions.
//! - Answer, from one table, whether an action is defined for a state.
//!
//! # Invariants
//! - The state set is closed; nothing extends it at runtime.
//! - `cancel` is defined for every non-terminal state and nothing else;
//!   it is one table row per cancellable state, not a wrapper type.
//! - A rejected action never mutates the aggregate.

use serde::{Deserialize, Serialize};

/// The states a project moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    Formation,
    PeerReview,
    ManagerReview,
    Finished,
    Archived,
    Cancelled,
}

impl ProjectState {
    /// Stable string id used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formation => "formation",
            Self::PeerReview => "peer_review",
            Self::ManagerReview => "manager_review",
            Self::Finished => "finished",
            Self::Archived => "archived",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Lifecycle actions a caller can attempt on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectAction {
    AddRole,
    AssignRole,
    AddReviewTopic,
    AddMilestone,
    StartPeerReview,
    SubmitPeerReview,
    CompletePeerReviews,
    SubmitManagerReview,
    Archive,
    Cancel,
}

impl ProjectAction {
    /// Stable string id used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddRole => "add_role",
            Self::AssignRole => "assign_role",
            Self::AddReviewTopic => "add_review_topic",
            Self::AddMilestone => "add_milestone",
            Self::StartPeerReview => "start_peer_review",
            Self::SubmitPeerReview => "submit_peer_review",
            Self::CompletePeerReviews => "complete_peer_reviews",
            Self::SubmitManagerReview => "submit_manager_review",
            Self::Archive => "archive",
            Self::Cancel => "cancel",
        }
    }
}

/// Returns the actions defined for a state.
///
/// This is the whole transition table; every aggregate method consults it
/// before doing anything else. The `match` is exhaustive over states, so
/// adding a state without deciding its rows fails to compile.
pub fn allowed_actions(state: ProjectState) -> &'static [ProjectAction] {
    use ProjectAction::*;
    match state {
        ProjectState::Formation => &[
            AddRole,
            AssignRole,
            AddReviewTopic,
            AddMilestone,
            StartPeerReview,
            Cancel,
        ],
        ProjectState::PeerReview => &[SubmitPeerReview, CompletePeerReviews, Cancel],
        ProjectState::ManagerReview => &[SubmitManagerReview, Cancel],
        ProjectState::Finished => &[Archive],
        ProjectState::Archived => &[],
        ProjectState::Cancelled => &[],
    }
}

/// Whether `action` is defined for `state`.
pub fn action_allowed(state: ProjectState, action: ProjectAction) -> bool {
    allowed_actions(state).contains(&action)
}
