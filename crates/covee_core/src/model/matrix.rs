//! In-memory peer review matrix for one (milestone, review topic) pair.
//!
//! # Responsibility
//! - Hold the reviewer -> reviewee -> score shape the computers consume.
//! - Provide the normalized view the numeric methods rely on.
//!
//! # Invariants
//! - Diagonal cells never exist (self-review is rejected upstream).
//! - The matrix is immutable after construction.
//! - Rows arriving from the DTO boundary sum to ~1; `to_normalized_map`
//!   rescales away the residual floating error.

use crate::model::contribution::ContributionError;
use crate::model::ids::RoleId;
use crate::model::peer_review::PeerReview;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ComputeResult<T> = Result<T, ComputeError>;

/// Failures shared by every computer operating on a matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// Fewer than two peers appear as senders; no method is defined there.
    InsufficientPeers { found: usize },
    /// A computed share fell outside the contribution value range.
    Contribution(ContributionError),
}

impl Display for ComputeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientPeers { found } => {
                write!(f, "review analytics needs at least 2 peers, found {found}")
            }
            Self::Contribution(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ComputeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InsufficientPeers { .. } => None,
            Self::Contribution(err) => Some(err),
        }
    }
}

impl From<ContributionError> for ComputeError {
    fn from(value: ContributionError) -> Self {
        Self::Contribution(value)
    }
}

/// Immutable reviewer -> reviewee score matrix for one review topic.
///
/// Keyed with `BTreeMap` so iteration order is deterministic, which keeps
/// the computed metrics reproducible across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerReviewMatrix {
    rows: BTreeMap<RoleId, BTreeMap<RoleId, f64>>,
}

impl PeerReviewMatrix {
    /// Builds a matrix from the flat review collection of one topic.
    ///
    /// Reviews for other topics must be filtered out by the caller; the
    /// matrix does not second-guess the grouping.
    pub fn from_reviews<'a>(reviews: impl IntoIterator<Item = &'a PeerReview>) -> Self {
        let mut rows: BTreeMap<RoleId, BTreeMap<RoleId, f64>> = BTreeMap::new();
        for review in reviews {
            rows.entry(review.sender_role_id)
                .or_default()
                .insert(review.receiver_role_id, review.score);
        }
        Self { rows }
    }

    /// Returns the raw sender -> {receiver -> score} view.
    ///
    /// Senders with no submitted reviews are absent, and so are cells the
    /// sender never filled in.
    pub fn to_map(&self) -> &BTreeMap<RoleId, BTreeMap<RoleId, f64>> {
        &self.rows
    }

    /// Returns a dense view where every off-diagonal cell exists and every
    /// non-empty row sums to exactly 1.
    ///
    /// Missing cells are treated as 0. Rows are rescaled by their own sum to
    /// remove floating error from the ~1 row-sum arriving upstream; an
    /// all-zero row is kept as zeros since there is nothing to rescale.
    pub fn to_normalized_map(&self) -> BTreeMap<RoleId, BTreeMap<RoleId, f64>> {
        let peers = self.peers();
        let mut normalized = BTreeMap::new();
        for (sender, row) in &self.rows {
            let sum: f64 = row.values().sum();
            let mut dense = BTreeMap::new();
            for receiver in &peers {
                if receiver == sender {
                    continue;
                }
                let raw = row.get(receiver).copied().unwrap_or(0.0);
                let cell = if sum > 0.0 { raw / sum } else { raw };
                dense.insert(*receiver, cell);
            }
            normalized.insert(*sender, dense);
        }
        normalized
    }

    /// Returns the set of role ids that appear as a sender.
    pub fn peers(&self) -> BTreeSet<RoleId> {
        self.rows.keys().copied().collect()
    }

    /// Number of peers (senders) in the matrix.
    pub fn peer_count(&self) -> usize {
        self.rows.len()
    }
}
