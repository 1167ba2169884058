//! Project aggregate: roles, review topics, milestones and the guarded
//! lifecycle transitions between states.
//!
//! # Responsibility
//! - Enforce the transition table before any mutation.
//! - Run the review analytics seam on `complete_peer_reviews` and store the
//!   computed metrics on the active milestone.
//! - Accumulate domain events in raise order until the caller drains them.
//!
//! # Invariants
//! - A rejected action leaves the aggregate byte-for-byte unchanged.
//! - Metrics are computed for every review topic before any of them is
//!   stored and before the state changes.
//! - The event buffer is append-only between drains; `drain_events` clears
//!   it exactly once.

use crate::model::consensuality::Consensuality;
use crate::model::contribution::Contribution;
use crate::model::event::DomainEvent;
use crate::model::ids::{MilestoneId, ProjectId, ReviewTopicId, RoleId, UserId};
use crate::model::lifecycle::{action_allowed, ProjectAction, ProjectState};
use crate::model::matrix::{ComputeError, PeerReviewMatrix};
use crate::model::peer_review::{PeerReview, PeerReviewError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ProjectResult<T> = Result<T, ProjectError>;

/// Failures of lifecycle actions. All of them are deterministic functions of
/// the aggregate and the input; none is transient or retryable.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectError {
    /// The action is not defined for the current state.
    InvalidStateTransition {
        current: ProjectState,
        action: ProjectAction,
    },
    /// The acting user is not the project creator.
    NotCreator {
        actor: UserId,
        action: ProjectAction,
    },
    /// `start_peer_review` needs at least one review topic.
    InsufficientReviewTopicAmount { found: usize },
    /// `start_peer_review` needs at least two roles with an assignee.
    InsufficientAssignedRoles { found: usize },
    RoleNotFound(RoleId),
    ReviewTopicNotFound(ReviewTopicId),
    /// The sender role belongs to someone else.
    RoleNotAssignedToActor { role_id: RoleId, actor: UserId },
    /// The same (sender, receiver, topic) review was already submitted.
    DuplicatePeerReview {
        sender_role_id: RoleId,
        receiver_role_id: RoleId,
        review_topic_id: ReviewTopicId,
    },
    /// An assigned role has not reviewed every other assigned role for a topic.
    PeerReviewsIncomplete {
        role_id: RoleId,
        review_topic_id: ReviewTopicId,
    },
    /// The project has no milestone to collect reviews for.
    NoActiveMilestone,
    PeerReview(PeerReviewError),
    Compute(ComputeError),
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStateTransition { current, action } => write!(
                f,
                "action {} is not defined for project state {}",
                action.as_str(),
                current.as_str()
            ),
            Self::NotCreator { actor, action } => write!(
                f,
                "user {actor} is not the project creator and cannot {}",
                action.as_str()
            ),
            Self::InsufficientReviewTopicAmount { found } => write!(
                f,
                "starting peer review requires at least 1 review topic, found {found}"
            ),
            Self::InsufficientAssignedRoles { found } => write!(
                f,
                "starting peer review requires at least 2 assigned roles, found {found}"
            ),
            Self::RoleNotFound(role_id) => write!(f, "role not found: {role_id}"),
            Self::ReviewTopicNotFound(topic_id) => {
                write!(f, "review topic not found: {topic_id}")
            }
            Self::RoleNotAssignedToActor { role_id, actor } => {
                write!(f, "role {role_id} is not assigned to user {actor}")
            }
            Self::DuplicatePeerReview {
                sender_role_id,
                receiver_role_id,
                review_topic_id,
            } => write!(
                f,
                "role {sender_role_id} already reviewed {receiver_role_id} for topic {review_topic_id}"
            ),
            Self::PeerReviewsIncomplete {
                role_id,
                review_topic_id,
            } => write!(
                f,
                "role {role_id} has not reviewed every peer for topic {review_topic_id}"
            ),
            Self::NoActiveMilestone => write!(f, "project has no active milestone"),
            Self::PeerReview(err) => write!(f, "{err}"),
            Self::Compute(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PeerReview(err) => Some(err),
            Self::Compute(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PeerReviewError> for ProjectError {
    fn from(value: PeerReviewError) -> Self {
        Self::PeerReview(value)
    }
}

impl From<ComputeError> for ProjectError {
    fn from(value: ComputeError) -> Self {
        Self::Compute(value)
    }
}

/// Whether the manager-review stage is skipped after peer review completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipManagerReview {
    Yes,
    #[default]
    No,
    IfConsensual,
}

impl SkipManagerReview {
    /// Evaluates the policy against the just-computed topic consensualities.
    ///
    /// # Panics
    /// `IfConsensual` with an empty slice: the policy is defined over
    /// computed consensuality, so evaluating it before the computation ran
    /// is a programmer error, not a recoverable condition.
    pub fn should_skip(self, consensualities: &[TopicConsensuality]) -> bool {
        match self {
            Self::Yes => true,
            Self::No => false,
            Self::IfConsensual => {
                assert!(
                    !consensualities.is_empty(),
                    "skip_manager_review=if_consensual evaluated before consensuality was computed"
                );
                consensualities
                    .iter()
                    .all(|topic| topic.consensuality.is_consensual())
            }
        }
    }
}

/// A position on the project that a user can fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub title: String,
    pub assignee: Option<UserId>,
}

impl Role {
    pub fn is_assigned(&self) -> bool {
        self.assignee.is_some()
    }
}

/// A dimension along which peers rate each other within a milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTopic {
    pub id: ReviewTopicId,
    pub title: String,
}

/// Computed agreement score for one review topic of a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopicConsensuality {
    pub review_topic_id: ReviewTopicId,
    pub consensuality: Consensuality,
}

/// Diagnostic collusion score for one review topic of a milestone.
///
/// Reporting only; it never gates a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopicCliquism {
    pub review_topic_id: ReviewTopicId,
    pub score: f64,
}

/// The metrics the analyzer produces for one review topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicMetrics {
    pub contributions: Vec<Contribution>,
    pub consensuality: Consensuality,
    pub cliquism: f64,
}

/// Analytics seam invoked by `complete_peer_reviews`, one call per review
/// topic of the active milestone. Implemented by the service layer.
pub trait MilestoneAnalyzer {
    fn analyze_topic(
        &self,
        review_topic_id: ReviewTopicId,
        matrix: &PeerReviewMatrix,
    ) -> Result<TopicMetrics, ComputeError>;
}

/// One round of peer review and its computed metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub title: String,
    #[serde(default)]
    pub peer_reviews: Vec<PeerReview>,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
    #[serde(default)]
    pub consensualities: Vec<TopicConsensuality>,
    #[serde(default)]
    pub cliquisms: Vec<TopicCliquism>,
}

impl Milestone {
    fn new(title: impl Into<String>) -> Self {
        Self {
            id: MilestoneId::new(),
            title: title.into(),
            peer_reviews: Vec::new(),
            contributions: Vec::new(),
            consensualities: Vec::new(),
            cliquisms: Vec::new(),
        }
    }

    /// Reviews submitted for one topic, in submission order.
    pub fn reviews_for_topic(&self, review_topic_id: ReviewTopicId) -> Vec<&PeerReview> {
        self.peer_reviews
            .iter()
            .filter(|review| review.review_topic_id == review_topic_id)
            .collect()
    }
}

/// The project aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    creator_id: UserId,
    title: String,
    state: ProjectState,
    skip_manager_review: SkipManagerReview,
    roles: Vec<Role>,
    review_topics: Vec<ReviewTopic>,
    milestones: Vec<Milestone>,
    #[serde(skip)]
    domain_events: Vec<DomainEvent>,
}

impl Project {
    /// Creates a project in `Formation` with a fresh id.
    pub fn new(
        creator_id: UserId,
        title: impl Into<String>,
        skip_manager_review: SkipManagerReview,
    ) -> Self {
        Self::with_id(ProjectId::new(), creator_id, title, skip_manager_review)
    }

    /// Creates a project whose identity already exists externally.
    pub fn with_id(
        id: ProjectId,
        creator_id: UserId,
        title: impl Into<String>,
        skip_manager_review: SkipManagerReview,
    ) -> Self {
        Self {
            id,
            creator_id,
            title: title.into(),
            state: ProjectState::Formation,
            skip_manager_review,
            roles: Vec::new(),
            review_topics: Vec::new(),
            milestones: Vec::new(),
            domain_events: Vec::new(),
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn creator_id(&self) -> UserId {
        self.creator_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> ProjectState {
        self.state
    }

    pub fn skip_manager_review(&self) -> SkipManagerReview {
        self.skip_manager_review
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn review_topics(&self) -> &[ReviewTopic] {
        &self.review_topics
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// The milestone reviews are currently collected for (the latest one).
    pub fn active_milestone(&self) -> Option<&Milestone> {
        self.milestones.last()
    }

    /// Events raised since the last drain, in raise order.
    pub fn domain_events(&self) -> &[DomainEvent] {
        &self.domain_events
    }

    /// Reads and clears the accumulated events.
    ///
    /// Called by the command handler after a successful save, so every
    /// raised event is flushed at least once.
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.domain_events)
    }

    /// Adds a role. Formation state, creator only.
    pub fn add_role(&mut self, actor: UserId, title: impl Into<String>) -> ProjectResult<RoleId> {
        self.guard(ProjectAction::AddRole)?;
        self.guard_creator(actor, ProjectAction::AddRole)?;
        let role = Role {
            id: RoleId::new(),
            title: title.into(),
            assignee: None,
        };
        let id = role.id;
        self.roles.push(role);
        Ok(id)
    }

    /// Assigns a user to a role. Formation state, creator only.
    pub fn assign_role(
        &mut self,
        actor: UserId,
        role_id: RoleId,
        assignee: UserId,
    ) -> ProjectResult<()> {
        self.guard(ProjectAction::AssignRole)?;
        self.guard_creator(actor, ProjectAction::AssignRole)?;
        let role = self
            .roles
            .iter_mut()
            .find(|role| role.id == role_id)
            .ok_or(ProjectError::RoleNotFound(role_id))?;
        role.assignee = Some(assignee);
        Ok(())
    }

    /// Adds a review topic. Formation state, creator only.
    pub fn add_review_topic(
        &mut self,
        actor: UserId,
        title: impl Into<String>,
    ) -> ProjectResult<ReviewTopicId> {
        self.guard(ProjectAction::AddReviewTopic)?;
        self.guard_creator(actor, ProjectAction::AddReviewTopic)?;
        let topic = ReviewTopic {
            id: ReviewTopicId::new(),
            title: title.into(),
        };
        let id = topic.id;
        self.review_topics.push(topic);
        Ok(id)
    }

    /// Adds a milestone. Formation state, creator only. The newest milestone
    /// becomes the active one.
    pub fn add_milestone(
        &mut self,
        actor: UserId,
        title: impl Into<String>,
    ) -> ProjectResult<MilestoneId> {
        self.guard(ProjectAction::AddMilestone)?;
        self.guard_creator(actor, ProjectAction::AddMilestone)?;
        let milestone = Milestone::new(title);
        let id = milestone.id;
        self.milestones.push(milestone);
        Ok(id)
    }

    /// Formation -> PeerReview.
    ///
    /// Guards: at least one review topic and at least two assigned roles.
    /// Raises `ProjectFormationFinished`.
    pub fn start_peer_review(&mut self) -> ProjectResult<()> {
        self.guard(ProjectAction::StartPeerReview)?;
        if self.review_topics.is_empty() {
            return Err(ProjectError::InsufficientReviewTopicAmount { found: 0 });
        }
        let assigned = self.assigned_roles().count();
        if assigned < 2 {
            return Err(ProjectError::InsufficientAssignedRoles { found: assigned });
        }
        self.state = ProjectState::PeerReview;
        self.raise(DomainEvent::ProjectFormationFinished {
            project_id: self.id,
        });
        Ok(())
    }

    /// Records one peer review on the active milestone. PeerReview state.
    ///
    /// The sender role must be assigned to the acting user; sender, receiver
    /// and topic must exist on the project; resubmitting the same
    /// (sender, receiver, topic) triple is rejected.
    pub fn submit_peer_review(
        &mut self,
        actor: UserId,
        sender_role_id: RoleId,
        receiver_role_id: RoleId,
        review_topic_id: ReviewTopicId,
        score: f64,
    ) -> ProjectResult<()> {
        self.guard(ProjectAction::SubmitPeerReview)?;
        let sender = self
            .roles
            .iter()
            .find(|role| role.id == sender_role_id)
            .ok_or(ProjectError::RoleNotFound(sender_role_id))?;
        if sender.assignee != Some(actor) {
            return Err(ProjectError::RoleNotAssignedToActor {
                role_id: sender_role_id,
                actor,
            });
        }
        if !self.roles.iter().any(|role| role.id == receiver_role_id) {
            return Err(ProjectError::RoleNotFound(receiver_role_id));
        }
        if !self.review_topics.iter().any(|t| t.id == review_topic_id) {
            return Err(ProjectError::ReviewTopicNotFound(review_topic_id));
        }
        let review = PeerReview::new(sender_role_id, receiver_role_id, review_topic_id, score)?;
        let milestone = self
            .milestones
            .last_mut()
            .ok_or(ProjectError::NoActiveMilestone)?;
        let duplicate = milestone.peer_reviews.iter().any(|existing| {
            existing.sender_role_id == sender_role_id
                && existing.receiver_role_id == receiver_role_id
                && existing.review_topic_id == review_topic_id
        });
        if duplicate {
            return Err(ProjectError::DuplicatePeerReview {
                sender_role_id,
                receiver_role_id,
                review_topic_id,
            });
        }
        milestone.peer_reviews.push(review);
        Ok(())
    }

    /// PeerReview -> ManagerReview, or straight to Finished when the skip
    /// policy says so.
    ///
    /// Guards: every assigned role has reviewed every other assigned role
    /// for every review topic of the active milestone. Runs the analyzer
    /// per topic, stores the metrics, then raises
    /// `ProjectPeerReviewFinished` (and `ProjectFinished` when skipping).
    pub fn complete_peer_reviews(&mut self, analyzer: &dyn MilestoneAnalyzer) -> ProjectResult<()> {
        self.guard(ProjectAction::CompletePeerReviews)?;
        let milestone_index = self
            .milestones
            .len()
            .checked_sub(1)
            .ok_or(ProjectError::NoActiveMilestone)?;
        self.guard_reviews_complete(&self.milestones[milestone_index])?;

        // Compute everything before storing anything, so a failing topic
        // leaves the aggregate untouched.
        let mut contributions = Vec::new();
        let mut consensualities = Vec::new();
        let mut cliquisms = Vec::new();
        for topic in &self.review_topics {
            let reviews = self.milestones[milestone_index].reviews_for_topic(topic.id);
            let matrix = PeerReviewMatrix::from_reviews(reviews.into_iter());
            let metrics = analyzer.analyze_topic(topic.id, &matrix)?;
            contributions.extend(metrics.contributions);
            consensualities.push(TopicConsensuality {
                review_topic_id: topic.id,
                consensuality: metrics.consensuality,
            });
            cliquisms.push(TopicCliquism {
                review_topic_id: topic.id,
                score: metrics.cliquism,
            });
        }

        let skip = self.skip_manager_review.should_skip(&consensualities);

        let milestone = &mut self.milestones[milestone_index];
        milestone.contributions = contributions;
        milestone.consensualities = consensualities;
        milestone.cliquisms = cliquisms;
        let milestone_id = milestone.id;

        self.raise(DomainEvent::ProjectPeerReviewFinished {
            project_id: self.id,
            milestone_id,
        });
        if skip {
            self.state = ProjectState::Finished;
            self.raise(DomainEvent::ProjectFinished {
                project_id: self.id,
            });
        } else {
            self.state = ProjectState::ManagerReview;
        }
        Ok(())
    }

    /// ManagerReview -> Finished. Creator only.
    pub fn submit_manager_review(&mut self, actor: UserId) -> ProjectResult<()> {
        self.guard(ProjectAction::SubmitManagerReview)?;
        self.guard_creator(actor, ProjectAction::SubmitManagerReview)?;
        self.state = ProjectState::Finished;
        self.raise(DomainEvent::ProjectManagerReviewFinished {
            project_id: self.id,
        });
        self.raise(DomainEvent::ProjectFinished {
            project_id: self.id,
        });
        Ok(())
    }

    /// Finished -> Archived. Any actor.
    pub fn archive(&mut self) -> ProjectResult<()> {
        self.guard(ProjectAction::Archive)?;
        self.state = ProjectState::Archived;
        self.raise(DomainEvent::ProjectArchived {
            project_id: self.id,
        });
        Ok(())
    }

    /// Any non-terminal state -> Cancelled. Creator only.
    pub fn cancel(&mut self, actor: UserId) -> ProjectResult<()> {
        self.guard(ProjectAction::Cancel)?;
        self.guard_creator(actor, ProjectAction::Cancel)?;
        self.state = ProjectState::Cancelled;
        self.raise(DomainEvent::ProjectCancelled {
            project_id: self.id,
        });
        Ok(())
    }

    fn assigned_roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter().filter(|role| role.is_assigned())
    }

    fn guard(&self, action: ProjectAction) -> ProjectResult<()> {
        if action_allowed(self.state, action) {
            Ok(())
        } else {
            Err(ProjectError::InvalidStateTransition {
                current: self.state,
                action,
            })
        }
    }

    fn guard_creator(&self, actor: UserId, action: ProjectAction) -> ProjectResult<()> {
        if actor == self.creator_id {
            Ok(())
        } else {
            Err(ProjectError::NotCreator { actor, action })
        }
    }

    fn guard_reviews_complete(&self, milestone: &Milestone) -> ProjectResult<()> {
        let assigned: Vec<RoleId> = self.assigned_roles().map(|role| role.id).collect();
        for topic in &self.review_topics {
            for sender in &assigned {
                for receiver in &assigned {
                    if sender == receiver {
                        continue;
                    }
                    let submitted = milestone.peer_reviews.iter().any(|review| {
                        review.sender_role_id == *sender
                            && review.receiver_role_id == *receiver
                            && review.review_topic_id == topic.id
                    });
                    if !submitted {
                        return Err(ProjectError::PeerReviewsIncomplete {
                            role_id: *sender,
                            review_topic_id: topic.id,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn raise(&mut self, event: DomainEvent) {
        self.domain_events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{Project, ProjectError, SkipManagerReview, TopicConsensuality};
    use crate::model::consensuality::Consensuality;
    use crate::model::ids::UserId;
    use crate::model::lifecycle::{ProjectAction, ProjectState};

    #[test]
    fn new_project_starts_in_formation_with_no_events() {
        let creator = UserId::new();
        let project = Project::new(creator, "covee", SkipManagerReview::No);
        assert_eq!(project.state(), ProjectState::Formation);
        assert_eq!(project.creator_id(), creator);
        assert!(project.domain_events().is_empty());
    }

    #[test]
    fn non_creator_cannot_mutate_formation_collections() {
        let creator = UserId::new();
        let stranger = UserId::new();
        let mut project = Project::new(creator, "covee", SkipManagerReview::No);
        let err = project
            .add_role(stranger, "backend")
            .expect_err("stranger must be rejected");
        assert_eq!(
            err,
            ProjectError::NotCreator {
                actor: stranger,
                action: ProjectAction::AddRole,
            }
        );
        assert!(project.roles().is_empty());
    }

    #[test]
    fn start_peer_review_enforces_topic_and_role_guards() {
        let creator = UserId::new();
        let mut project = Project::new(creator, "covee", SkipManagerReview::No);

        let err = project
            .start_peer_review()
            .expect_err("no topics must be rejected");
        assert_eq!(err, ProjectError::InsufficientReviewTopicAmount { found: 0 });

        project
            .add_review_topic(creator, "P1 quality")
            .expect("creator adds topic");
        let role = project.add_role(creator, "backend").expect("creator adds role");
        project
            .assign_role(creator, role, UserId::new())
            .expect("creator assigns role");

        let err = project
            .start_peer_review()
            .expect_err("one assigned role must be rejected");
        assert_eq!(err, ProjectError::InsufficientAssignedRoles { found: 1 });
        assert_eq!(project.state(), ProjectState::Formation);
    }

    #[test]
    fn should_skip_policy_matrix() {
        let consensual = vec![TopicConsensuality {
            review_topic_id: crate::model::ids::ReviewTopicId::new(),
            consensuality: Consensuality::clamped(0.9),
        }];
        let divided = vec![TopicConsensuality {
            review_topic_id: crate::model::ids::ReviewTopicId::new(),
            consensuality: Consensuality::clamped(0.3),
        }];

        assert!(SkipManagerReview::Yes.should_skip(&divided));
        assert!(!SkipManagerReview::No.should_skip(&consensual));
        assert!(SkipManagerReview::IfConsensual.should_skip(&consensual));
        assert!(!SkipManagerReview::IfConsensual.should_skip(&divided));
    }

    #[test]
    #[should_panic(expected = "before consensuality was computed")]
    fn if_consensual_without_computation_is_a_programmer_error() {
        SkipManagerReview::IfConsensual.should_skip(&[]);
    }
}
