//! Peer review entity and its construction guards.
//!
//! # Responsibility
//! - Represent one reviewer-to-reviewee score for one review topic.
//! - Reject structurally invalid reviews at construction time.
//!
//! # Invariants
//! - `sender_role_id != receiver_role_id` (no self-review), always.
//! - `score` is a finite value in `[0, 1]`.
//! - A constructed review is immutable; it is owned by the milestone that
//!   collected it.

use crate::model::ids::{ReviewTopicId, RoleId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PeerReviewResult<T> = Result<T, PeerReviewError>;

/// Construction-time violations for a peer review.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerReviewError {
    /// Sender and receiver role are the same.
    SelfPeerReview(RoleId),
    /// Score is not a finite value in `[0, 1]`.
    ScoreOutOfRange(f64),
}

impl Display for PeerReviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfPeerReview(role_id) => {
                write!(f, "role {role_id} cannot submit a peer review about itself")
            }
            Self::ScoreOutOfRange(score) => {
                write!(f, "peer review score must be in [0, 1], got {score}")
            }
        }
    }
}

impl Error for PeerReviewError {}

/// One reviewer-to-reviewee score for one review topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerReview {
    pub sender_role_id: RoleId,
    pub receiver_role_id: RoleId,
    pub review_topic_id: ReviewTopicId,
    pub score: f64,
}

impl PeerReview {
    /// Builds a validated peer review.
    ///
    /// # Errors
    /// - `SelfPeerReview` when sender and receiver are the same role.
    /// - `ScoreOutOfRange` when the score is NaN, infinite or outside `[0, 1]`.
    pub fn new(
        sender_role_id: RoleId,
        receiver_role_id: RoleId,
        review_topic_id: ReviewTopicId,
        score: f64,
    ) -> PeerReviewResult<Self> {
        if sender_role_id == receiver_role_id {
            return Err(PeerReviewError::SelfPeerReview(sender_role_id));
        }
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(PeerReviewError::ScoreOutOfRange(score));
        }
        Ok(Self {
            sender_role_id,
            receiver_role_id,
            review_topic_id,
            score,
        })
    }
}
