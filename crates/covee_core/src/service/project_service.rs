//! Command facade over the project aggregate.
//!
//! # Responsibility
//! - Provide one entry point per lifecycle action for command handlers.
//! - Enforce the load -> transition -> save -> drain -> publish sequence.
//!
//! # Invariants
//! - Events are published only after `save` succeeded.
//! - Each drained event set is published exactly once.
//! - The service never bypasses the aggregate's guards.

use crate::model::event::{DomainEventPublisher, PublishError};
use crate::model::ids::{MilestoneId, ProjectId, ReviewTopicId, RoleId, UserId};
use crate::model::project::{Project, ProjectError, ProjectResult, SkipManagerReview};
use crate::repo::project_repo::{ProjectRepository, RepoError};
use crate::service::analyzer::ReviewAnalyzer;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures crossing the command facade, one variant per collaborator.
#[derive(Debug)]
pub enum ServiceError {
    Project(ProjectError),
    Repo(RepoError),
    Publish(PublishError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Publish(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Project(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Publish(err) => Some(err),
        }
    }
}

impl From<ProjectError> for ServiceError {
    fn from(value: ProjectError) -> Self {
        Self::Project(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<PublishError> for ServiceError {
    fn from(value: PublishError) -> Self {
        Self::Publish(value)
    }
}

/// Use-case service wrapping repository, publisher and analyzer.
pub struct ProjectService<R: ProjectRepository, P: DomainEventPublisher> {
    repo: R,
    publisher: P,
    analyzer: ReviewAnalyzer,
}

impl<R: ProjectRepository, P: DomainEventPublisher> ProjectService<R, P> {
    /// Creates a service with the default (production) analyzer.
    pub fn new(repo: R, publisher: P) -> Self {
        Self::with_analyzer(repo, publisher, ReviewAnalyzer::default())
    }

    /// Creates a service around an explicitly configured analyzer.
    pub fn with_analyzer(repo: R, publisher: P, analyzer: ReviewAnalyzer) -> Self {
        Self {
            repo,
            publisher,
            analyzer,
        }
    }

    /// Creates and persists a new project in `Formation`.
    pub fn create_project(
        &self,
        creator_id: UserId,
        title: impl Into<String>,
        skip_manager_review: SkipManagerReview,
    ) -> ServiceResult<ProjectId> {
        let project = Project::new(creator_id, title, skip_manager_review);
        self.repo.save(&project)?;
        info!(
            "event=project_created module=service status=ok project={} state={}",
            project.id(),
            project.state().as_str()
        );
        Ok(project.id())
    }

    pub fn add_role(
        &self,
        project_id: ProjectId,
        actor: UserId,
        title: impl Into<String>,
    ) -> ServiceResult<RoleId> {
        let title = title.into();
        self.apply(project_id, "add_role", |project| {
            project.add_role(actor, title)
        })
    }

    pub fn assign_role(
        &self,
        project_id: ProjectId,
        actor: UserId,
        role_id: RoleId,
        assignee: UserId,
    ) -> ServiceResult<()> {
        self.apply(project_id, "assign_role", |project| {
            project.assign_role(actor, role_id, assignee)
        })
    }

    pub fn add_review_topic(
        &self,
        project_id: ProjectId,
        actor: UserId,
        title: impl Into<String>,
    ) -> ServiceResult<ReviewTopicId> {
        let title = title.into();
        self.apply(project_id, "add_review_topic", |project| {
            project.add_review_topic(actor, title)
        })
    }

    pub fn add_milestone(
        &self,
        project_id: ProjectId,
        actor: UserId,
        title: impl Into<String>,
    ) -> ServiceResult<MilestoneId> {
        let title = title.into();
        self.apply(project_id, "add_milestone", |project| {
            project.add_milestone(actor, title)
        })
    }

    pub fn start_peer_review(&self, project_id: ProjectId) -> ServiceResult<()> {
        self.apply(project_id, "start_peer_review", |project| {
            project.start_peer_review()
        })
    }

    pub fn submit_peer_review(
        &self,
        project_id: ProjectId,
        actor: UserId,
        sender_role_id: RoleId,
        receiver_role_id: RoleId,
        review_topic_id: ReviewTopicId,
        score: f64,
    ) -> ServiceResult<()> {
        self.apply(project_id, "submit_peer_review", |project| {
            project.submit_peer_review(actor, sender_role_id, receiver_role_id, review_topic_id, score)
        })
    }

    /// Completes the peer-review round: runs the analytics engine, stores
    /// the metrics and moves to manager review (or finishes, per policy).
    pub fn complete_peer_reviews(&self, project_id: ProjectId) -> ServiceResult<()> {
        self.apply(project_id, "complete_peer_reviews", |project| {
            project.complete_peer_reviews(&self.analyzer)
        })
    }

    pub fn submit_manager_review(
        &self,
        project_id: ProjectId,
        actor: UserId,
    ) -> ServiceResult<()> {
        self.apply(project_id, "submit_manager_review", |project| {
            project.submit_manager_review(actor)
        })
    }

    pub fn archive(&self, project_id: ProjectId) -> ServiceResult<()> {
        self.apply(project_id, "archive", |project| project.archive())
    }

    pub fn cancel(&self, project_id: ProjectId, actor: UserId) -> ServiceResult<()> {
        self.apply(project_id, "cancel", |project| project.cancel(actor))
    }

    /// Loads, applies one guarded action, saves, then publishes the drained
    /// events. A failed action or save publishes nothing.
    fn apply<T>(
        &self,
        project_id: ProjectId,
        action: &str,
        mutate: impl FnOnce(&mut Project) -> ProjectResult<T>,
    ) -> ServiceResult<T> {
        let mut project = self.repo.load(project_id)?;
        let outcome = mutate(&mut project)?;
        let events = project.drain_events();
        self.repo.save(&project)?;
        if !events.is_empty() {
            self.publisher.publish(&events)?;
        }
        info!(
            "event=project_action module=service status=ok project={project_id} action={action} state={} events={}",
            project.state().as_str(),
            events.len()
        );
        Ok(outcome)
    }
}
