//! Contribution shares from a peer review matrix (the Covee method).
//!
//! # Responsibility
//! - Turn one topic's review matrix into relative contribution shares
//!   summing to 1.
//!
//! # Invariants
//! - Needs at least 2 peers; order of peers never changes the result.
//! - A peer credited by nobody gets exactly 0.
//!
//! The reporting model behind the matrix is `M[i][j] = c_j / (1 - c_i)`:
//! each reviewer distributes their view of everyone else's true share over
//! the credit that is not their own. Inverting one reviewer pair gives
//! `c_i = M[j][i] * (1 - M[i][j]) / (1 - M[i][j] * M[j][i])`, exact whenever
//! the matrix is self-consistent. Shares are the per-peer mean of these
//! pairwise estimates, normalized to sum 1.

use crate::model::contribution::Contribution;
use crate::model::ids::{ReviewTopicId, RoleId};
use crate::model::matrix::{ComputeError, ComputeResult, PeerReviewMatrix};
use std::collections::BTreeMap;

/// Pairs whose mutual scores multiply to ~1 carry no information about the
/// rest of the group and are skipped.
const DEGENERATE_PAIR_EPS: f64 = 1e-9;

/// Computes relative contribution shares for one review topic.
#[derive(Debug, Default)]
pub struct ContributionsComputer;

impl ContributionsComputer {
    pub fn new() -> Self {
        Self
    }

    /// Computes one contribution share per peer, summing to 1.
    ///
    /// # Errors
    /// - `InsufficientPeers` when fewer than 2 peers appear as senders.
    pub fn compute(
        &self,
        review_topic_id: ReviewTopicId,
        matrix: &PeerReviewMatrix,
    ) -> ComputeResult<Vec<Contribution>> {
        let peers: Vec<_> = matrix.peers().into_iter().collect();
        if peers.len() < 2 {
            return Err(ComputeError::InsufficientPeers { found: peers.len() });
        }
        let dense = matrix.to_normalized_map();
        let cell = |sender, receiver| dense[&sender][&receiver];

        let mut raw = Vec::with_capacity(peers.len());
        for &peer in &peers {
            let mut estimates = Vec::with_capacity(peers.len() - 1);
            for &reviewer in &peers {
                if reviewer == peer {
                    continue;
                }
                let of_peer = cell(reviewer, peer);
                let of_reviewer = cell(peer, reviewer);
                let denominator = 1.0 - of_reviewer * of_peer;
                if denominator.abs() < DEGENERATE_PAIR_EPS {
                    continue;
                }
                estimates.push(of_peer * (1.0 - of_reviewer) / denominator);
            }
            let estimate = if estimates.is_empty() {
                // All pairs degenerate (two peers rating each other 1.0):
                // fall back to the mean credit the peer received.
                mean_received(&dense, &peers, peer)
            } else {
                estimates.iter().sum::<f64>() / estimates.len() as f64
            };
            raw.push(estimate);
        }

        let total: f64 = raw.iter().sum();
        let mut contributions = Vec::with_capacity(peers.len());
        for (&peer, &estimate) in peers.iter().zip(&raw) {
            let amount = if total > 0.0 { estimate / total } else { 0.0 };
            contributions.push(Contribution::new(peer, review_topic_id, amount)?);
        }
        Ok(contributions)
    }
}

fn mean_received(
    dense: &BTreeMap<RoleId, BTreeMap<RoleId, f64>>,
    peers: &[RoleId],
    peer: RoleId,
) -> f64 {
    let received: f64 = peers
        .iter()
        .filter(|&&sender| sender != peer)
        .map(|sender| dense[sender][&peer])
        .sum();
    received / (peers.len() - 1) as f64
}
