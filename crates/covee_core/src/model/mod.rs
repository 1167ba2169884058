//! Domain model: value objects, entities and the project aggregate.
//!
//! # Responsibility
//! - Define the canonical data structures of the peer-review core.
//! - Keep every business invariant enforceable at construction time or
//!   behind an aggregate method.
//!
//! # Invariants
//! - Every domain object is identified by its own id newtype.
//! - Value objects (`Contribution`, `Consensuality`) are immutable once
//!   created.

pub mod consensuality;
pub mod contribution;
pub mod event;
pub mod ids;
pub mod lifecycle;
pub mod matrix;
pub mod peer_review;
pub mod project;
