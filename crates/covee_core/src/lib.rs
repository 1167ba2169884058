//! Core domain logic for the Covee peer-review backend.
//! This crate is the single source of truth for the project lifecycle
//! state machine and the peer-review analytics engine.

pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::consensuality::{Consensuality, ConsensualityError, CONSENSUAL_THRESHOLD};
pub use model::contribution::{Contribution, ContributionError};
pub use model::event::{DomainEvent, DomainEventPublisher, PublishError, PublishResult};
pub use model::ids::{MilestoneId, ProjectId, ReviewTopicId, RoleId, UserId};
pub use model::lifecycle::{action_allowed, allowed_actions, ProjectAction, ProjectState};
pub use model::matrix::{ComputeError, ComputeResult, PeerReviewMatrix};
pub use model::peer_review::{PeerReview, PeerReviewError};
pub use model::project::{
    Milestone, MilestoneAnalyzer, Project, ProjectError, ProjectResult, ReviewTopic, Role,
    SkipManagerReview, TopicCliquism, TopicConsensuality, TopicMetrics,
};
pub use repo::project_repo::{InMemoryProjectRepository, ProjectRepository, RepoError, RepoResult};
pub use service::analyzer::ReviewAnalyzer;
pub use service::cliquism::CliquismComputer;
pub use service::consensuality::{
    ConsensualityComputer, ConsensualityStrategy, MeanDeviationConsensualityComputer,
    NaxDeviationConsensualityComputer, VarianceConsensualityComputer,
};
pub use service::contributions::ContributionsComputer;
pub use service::project_service::{ProjectService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
