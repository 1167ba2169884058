//! Per-topic review analytics orchestration.
//!
//! # Responsibility
//! - Run the contributions, consensuality and cliquism computers over one
//!   topic's matrix and bundle the results for the aggregate.
//!
//! # Invariants
//! - The consensuality strategy is fixed at construction; no runtime
//!   reselection.
//! - Topics are independent; analyzing one never reads another.

use crate::model::ids::ReviewTopicId;
use crate::model::matrix::{ComputeError, PeerReviewMatrix};
use crate::model::project::{MilestoneAnalyzer, TopicMetrics};
use crate::service::cliquism::CliquismComputer;
use crate::service::consensuality::{ConsensualityComputer, ConsensualityStrategy};
use crate::service::contributions::ContributionsComputer;
use log::info;

/// Runs all computers for one review topic at a time.
///
/// Implements the `MilestoneAnalyzer` seam consumed by
/// `Project::complete_peer_reviews`.
pub struct ReviewAnalyzer {
    contributions: ContributionsComputer,
    consensuality: Box<dyn ConsensualityComputer>,
    cliquism: CliquismComputer,
}

impl ReviewAnalyzer {
    /// Builds an analyzer using the given consensuality strategy.
    pub fn new(strategy: ConsensualityStrategy) -> Self {
        Self::with_computer(strategy.computer())
    }

    /// Builds an analyzer around an injected consensuality computer.
    pub fn with_computer(consensuality: Box<dyn ConsensualityComputer>) -> Self {
        Self {
            contributions: ContributionsComputer::new(),
            consensuality,
            cliquism: CliquismComputer::new(),
        }
    }
}

impl Default for ReviewAnalyzer {
    fn default() -> Self {
        Self::new(ConsensualityStrategy::default())
    }
}

impl MilestoneAnalyzer for ReviewAnalyzer {
    fn analyze_topic(
        &self,
        review_topic_id: ReviewTopicId,
        matrix: &PeerReviewMatrix,
    ) -> Result<TopicMetrics, ComputeError> {
        let contributions = self.contributions.compute(review_topic_id, matrix)?;
        let consensuality = self.consensuality.compute(matrix)?;
        let cliquism = self.cliquism.compute(matrix)?;
        info!(
            "event=topic_analyzed module=service status=ok topic={} peers={} consensuality={:.6} cliquism={:.6}",
            review_topic_id,
            matrix.peer_count(),
            consensuality.value(),
            cliquism
        );
        Ok(TopicMetrics {
            contributions,
            consensuality,
            cliquism,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ReviewAnalyzer;
    use crate::model::ids::{ReviewTopicId, RoleId};
    use crate::model::matrix::PeerReviewMatrix;
    use crate::model::peer_review::PeerReview;
    use crate::model::project::MilestoneAnalyzer;

    #[test]
    fn analyzer_bundles_all_three_metrics() {
        let topic = ReviewTopicId::new();
        let (a, b, c) = (RoleId::new(), RoleId::new(), RoleId::new());
        let reviews = vec![
            PeerReview::new(a, b, topic, 0.5).expect("valid"),
            PeerReview::new(a, c, topic, 0.5).expect("valid"),
            PeerReview::new(b, a, topic, 0.5).expect("valid"),
            PeerReview::new(b, c, topic, 0.5).expect("valid"),
            PeerReview::new(c, a, topic, 0.5).expect("valid"),
            PeerReview::new(c, b, topic, 0.5).expect("valid"),
        ];
        let matrix = PeerReviewMatrix::from_reviews(&reviews);
        let metrics = ReviewAnalyzer::default()
            .analyze_topic(topic, &matrix)
            .expect("uniform matrix should analyze");

        assert_eq!(metrics.contributions.len(), 3);
        let total: f64 = metrics.contributions.iter().map(|c| c.amount).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((metrics.consensuality.value() - 1.0).abs() < 1e-9);
        assert!(metrics.cliquism.abs() < 1e-9);
    }
}
