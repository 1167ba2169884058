//! Cliquism diagnostic: reciprocal rating inflation within a matrix.
//!
//! # Responsibility
//! - Produce one aggregate score flagging pairs whose mutual ratings sit
//!   well above the group's opinion of them.
//!
//! # Invariants
//! - Reporting only; no lifecycle transition consults this score.
//! - 0 for a matrix that matches the group consensus; grows with inflation.
//! - A zero score in a denominator position never raises; the triple is
//!   simply skipped.
//!
//! For every ordered triple `(i, j, k)` the reviewer's relative preference
//! `M[i][j] / M[i][k]` is compared against the group's relative opinion
//! `avg(j) / avg(k)`, where `avg(x)` is the mean score `x` received. The
//! score is the mean positive excess across evaluable triples.

use crate::model::ids::RoleId;
use crate::model::matrix::{ComputeError, ComputeResult, PeerReviewMatrix};
use std::collections::BTreeMap;

/// Computes the reciprocal-inflation diagnostic for one topic's matrix.
#[derive(Debug, Default)]
pub struct CliquismComputer;

impl CliquismComputer {
    pub fn new() -> Self {
        Self
    }

    /// Returns the aggregate cliquism score, `>= 0`.
    ///
    /// # Errors
    /// - `InsufficientPeers` when fewer than 2 peers appear as senders.
    pub fn compute(&self, matrix: &PeerReviewMatrix) -> ComputeResult<f64> {
        let peers: Vec<_> = matrix.peers().into_iter().collect();
        if peers.len() < 2 {
            return Err(ComputeError::InsufficientPeers { found: peers.len() });
        }
        let dense = matrix.to_normalized_map();

        let mut received_average: BTreeMap<RoleId, f64> = BTreeMap::new();
        for &receiver in &peers {
            let total: f64 = peers
                .iter()
                .filter(|&&sender| sender != receiver)
                .map(|sender| dense[sender][&receiver])
                .sum();
            received_average.insert(receiver, total / (peers.len() - 1) as f64);
        }

        let mut excess = 0.0;
        let mut triples = 0usize;
        for &reviewer in &peers {
            for &favored in &peers {
                if favored == reviewer {
                    continue;
                }
                for &other in &peers {
                    if other == reviewer || other == favored {
                        continue;
                    }
                    let own_of_other = dense[&reviewer][&other];
                    let group_of_other = received_average[&other];
                    if own_of_other <= 0.0 || group_of_other <= 0.0 {
                        continue;
                    }
                    let preference = dense[&reviewer][&favored] / own_of_other;
                    let group_preference = received_average[&favored] / group_of_other;
                    excess += (preference - group_preference).max(0.0);
                    triples += 1;
                }
            }
        }

        if triples == 0 {
            return Ok(0.0);
        }
        Ok(excess / triples as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::CliquismComputer;
    use crate::model::ids::{ReviewTopicId, RoleId};
    use crate::model::peer_review::PeerReview;
    use crate::model::matrix::PeerReviewMatrix;

    fn matrix(peers: &[RoleId], rows: &[&[f64]]) -> PeerReviewMatrix {
        let topic = ReviewTopicId::new();
        let mut reviews = Vec::new();
        for (sender_index, &sender) in peers.iter().enumerate() {
            let mut column = 0usize;
            for &receiver in peers {
                if receiver == sender {
                    continue;
                }
                let score = rows[sender_index][column];
                column += 1;
                reviews.push(
                    PeerReview::new(sender, receiver, topic, score)
                        .expect("test review should be valid"),
                );
            }
        }
        PeerReviewMatrix::from_reviews(&reviews)
    }

    #[test]
    fn honest_uniform_matrix_scores_zero() {
        let peers: Vec<RoleId> = (0..4).map(|_| RoleId::new()).collect();
        let third = 1.0 / 3.0;
        let rows: &[&[f64]] = &[
            &[third, third, third],
            &[third, third, third],
            &[third, third, third],
            &[third, third, third],
        ];
        let score = CliquismComputer::new()
            .compute(&matrix(&peers, rows))
            .expect("uniform matrix should compute");
        assert!(score.abs() < 1e-12, "expected 0, got {score}");
    }

    #[test]
    fn zero_denominators_are_skipped_not_raised() {
        let peers: Vec<RoleId> = (0..3).map(|_| RoleId::new()).collect();
        // Second peer gives the third a hard zero.
        let rows: &[&[f64]] = &[&[0.5, 0.5], &[1.0, 0.0], &[0.5, 0.5]];
        let score = CliquismComputer::new()
            .compute(&matrix(&peers, rows))
            .expect("zero cells must not panic");
        assert!(score.is_finite());
        assert!(score >= 0.0);
    }
}
