//! Domain events raised by project lifecycle transitions.
//!
//! # Responsibility
//! - Name every externally observable lifecycle fact.
//! - Define the publishing seam the host application implements.
//!
//! # Invariants
//! - Events accumulate on the aggregate in raise order and are drained
//!   read-and-clear exactly once, after a successful save.

use crate::model::ids::{MilestoneId, ProjectId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lifecycle facts published to the host application's event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    ProjectFormationFinished {
        project_id: ProjectId,
    },
    ProjectPeerReviewFinished {
        project_id: ProjectId,
        milestone_id: MilestoneId,
    },
    ProjectManagerReviewFinished {
        project_id: ProjectId,
    },
    ProjectFinished {
        project_id: ProjectId,
    },
    ProjectArchived {
        project_id: ProjectId,
    },
    ProjectCancelled {
        project_id: ProjectId,
    },
}

pub type PublishResult<T> = Result<T, PublishError>;

/// Transport-level failure reported by a publisher implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishError {
    Backend(String),
}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(message) => write!(f, "event publishing failed: {message}"),
        }
    }
}

impl Error for PublishError {}

/// Outbound seam for drained domain events.
///
/// Implementations belong to the host application (message bus, outbox
/// table); the core only guarantees the event set and order per transition.
pub trait DomainEventPublisher {
    fn publish(&self, events: &[DomainEvent]) -> PublishResult<()>;
}
