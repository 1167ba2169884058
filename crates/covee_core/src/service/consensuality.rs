//! Consensuality strategies: how much the reviewers agree.
//!
//! # Responsibility
//! - Provide three interchangeable agreement measures over one topic's
//!   review matrix, each yielding a `Consensuality` in `[1e-8, 1]`.
//!
//! # Invariants
//! - Every strategy rejects fewer than 2 peers.
//! - A perfectly uniform matrix (every cell `1/(n-1)`) yields ~1 under
//!   every strategy.
//! - The normalizers contain an `n - 2` factor and vanish at `n = 2`;
//!   a vanished normalizer with zero accumulated deviation is full
//!   consensus.

use crate::model::consensuality::Consensuality;
use crate::model::ids::RoleId;
use crate::model::matrix::{ComputeError, ComputeResult, PeerReviewMatrix};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One agreement measure over a review matrix. 1.0 is full consensus.
pub trait ConsensualityComputer {
    fn compute(&self, matrix: &PeerReviewMatrix) -> ComputeResult<Consensuality>;
}

/// Host-selectable strategy. `NaxDeviation` is the production default; the
/// other two share the same contract and exist as alternates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensualityStrategy {
    #[default]
    NaxDeviation,
    MeanDeviation,
    Variance,
}

impl ConsensualityStrategy {
    /// Instantiates the computer for this strategy.
    pub fn computer(self) -> Box<dyn ConsensualityComputer> {
        match self {
            Self::NaxDeviation => Box::new(NaxDeviationConsensualityComputer),
            Self::MeanDeviation => Box::new(MeanDeviationConsensualityComputer),
            Self::Variance => Box::new(VarianceConsensualityComputer),
        }
    }
}

fn normalized_peers(
    matrix: &PeerReviewMatrix,
) -> ComputeResult<(Vec<RoleId>, BTreeMap<RoleId, BTreeMap<RoleId, f64>>)> {
    let peers: Vec<_> = matrix.peers().into_iter().collect();
    if peers.len() < 2 {
        return Err(ComputeError::InsufficientPeers { found: peers.len() });
    }
    Ok((peers, matrix.to_normalized_map()))
}

/// Deviation from the degenerate-normalizer consensus rule: zero deviation
/// over a zero normalizer is agreement, anything else is none.
fn normalize_deviation(total: f64, max: f64) -> Consensuality {
    if max > 0.0 {
        Consensuality::clamped(1.0 - total / max)
    } else if total <= 0.0 {
        Consensuality::clamped(1.0)
    } else {
        Consensuality::clamped(0.0)
    }
}

/// Reference strategy: total absolute deviation of every ordered-pair score
/// from the uniform expectation `1/(n-1)`, normalized by `2n(n-2)/(n-1)`.
#[derive(Debug, Default)]
pub struct NaxDeviationConsensualityComputer;

impl ConsensualityComputer for NaxDeviationConsensualityComputer {
    fn compute(&self, matrix: &PeerReviewMatrix) -> ComputeResult<Consensuality> {
        let (peers, dense) = normalized_peers(matrix)?;
        let n = peers.len() as f64;
        let expected = 1.0 / (n - 1.0);

        let mut total_deviation = 0.0;
        for sender in &peers {
            for receiver in &peers {
                if sender == receiver {
                    continue;
                }
                total_deviation += (expected - dense[sender][receiver]).abs();
            }
        }
        let max_deviation = 2.0 * n * (n - 2.0) / (n - 1.0);
        Ok(normalize_deviation(total_deviation, max_deviation))
    }
}

/// Alternate strategy: per-receiver deviation from the column mean,
/// normalized by `2(n-2)/(n-1)` and averaged across columns.
#[derive(Debug, Default)]
pub struct MeanDeviationConsensualityComputer;

impl ConsensualityComputer for MeanDeviationConsensualityComputer {
    fn compute(&self, matrix: &PeerReviewMatrix) -> ComputeResult<Consensuality> {
        let (peers, dense) = normalized_peers(matrix)?;
        let n = peers.len() as f64;
        let max_column_deviation = 2.0 * (n - 2.0) / (n - 1.0);

        let mut total_deviation = 0.0;
        for receiver in &peers {
            let column: Vec<f64> = peers
                .iter()
                .filter(|sender| *sender != receiver)
                .map(|sender| dense[sender][receiver])
                .collect();
            let mean = column.iter().sum::<f64>() / column.len() as f64;
            total_deviation += column.iter().map(|score| (score - mean).abs()).sum::<f64>();
        }
        // Averaging per-column normalized deviations equals normalizing the
        // total by n * max_column_deviation.
        Ok(normalize_deviation(
            total_deviation,
            n * max_column_deviation,
        ))
    }
}

/// Alternate strategy: per-receiver score variance normalized against the
/// worst-case column `[1, 0, ..., 0]`, averaged across columns.
#[derive(Debug, Default)]
pub struct VarianceConsensualityComputer;

impl ConsensualityComputer for VarianceConsensualityComputer {
    fn compute(&self, matrix: &PeerReviewMatrix) -> ComputeResult<Consensuality> {
        let (peers, dense) = normalized_peers(matrix)?;
        let n = peers.len() as f64;
        let column_len = n - 1.0;
        let worst_mean = 1.0 / column_len;
        let worst_variance = ((1.0 - worst_mean).powi(2)
            + (column_len - 1.0) * worst_mean.powi(2))
            / column_len;

        let mut total_variance = 0.0;
        for receiver in &peers {
            let column: Vec<f64> = peers
                .iter()
                .filter(|sender| *sender != receiver)
                .map(|sender| dense[sender][receiver])
                .collect();
            let mean = column.iter().sum::<f64>() / column.len() as f64;
            total_variance += column
                .iter()
                .map(|score| (score - mean).powi(2))
                .sum::<f64>()
                / column.len() as f64;
        }
        Ok(normalize_deviation(total_variance, n * worst_variance))
    }
}
