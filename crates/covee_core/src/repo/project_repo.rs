//! Project repository contract and the in-memory implementation.
//!
//! # Responsibility
//! - Define the narrow persistence seam the command facade depends on.
//! - Provide an in-memory implementation for tests and embedded use.
//!
//! # Invariants
//! - `save` stores the aggregate as handed in; the core never persists the
//!   transient event buffer (it is drained by the caller, not stored).
//! - `load` returns an owned aggregate; the host enforces
//!   at-most-one-writer per aggregate around it.

use crate::model::ids::ProjectId;
use crate::model::project::Project;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer failures.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoError {
    NotFound(ProjectId),
    Backend(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::Backend(message) => write!(f, "project storage failed: {message}"),
        }
    }
}

impl Error for RepoError {}

/// Narrow persistence contract for project aggregates.
pub trait ProjectRepository {
    fn load(&self, id: ProjectId) -> RepoResult<Project>;
    fn save(&self, project: &Project) -> RepoResult<()>;
}

/// Map-backed repository. The host application brings its own durable
/// implementation; this one backs tests and embedded single-process use.
#[derive(Debug, Default)]
pub struct InMemoryProjectRepository {
    projects: Mutex<HashMap<ProjectId, Project>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> RepoResult<std::sync::MutexGuard<'_, HashMap<ProjectId, Project>>> {
        self.projects
            .lock()
            .map_err(|_| RepoError::Backend("project map lock poisoned".to_string()))
    }
}

impl ProjectRepository for InMemoryProjectRepository {
    fn load(&self, id: ProjectId) -> RepoResult<Project> {
        let projects = self.guard()?;
        projects.get(&id).cloned().ok_or(RepoError::NotFound(id))
    }

    fn save(&self, project: &Project) -> RepoResult<()> {
        let mut projects = self.guard()?;
        projects.insert(project.id(), project.clone());
        Ok(())
    }
}
