//! Persistence seam for the project aggregate.
//!
//! # Responsibility
//! - Define load/save contracts the command facade depends on.
//! - Keep storage details out of model and service layers.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) distinct from
//!   backend transport errors.

pub mod project_repo;
