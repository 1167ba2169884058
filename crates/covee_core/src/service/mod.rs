//! Core use-case services: the analytics computers and the command facade.
//!
//! # Responsibility
//! - House the numeric methods that turn review matrices into metrics.
//! - Orchestrate repository and publisher collaborators around the
//!   aggregate's guarded transitions.
//!
//! # Invariants
//! - Computers are pure; they read a matrix and return values, nothing else.
//! - The facade is the only place save/publish ordering is decided.

pub mod analyzer;
pub mod cliquism;
pub mod consensuality;
pub mod contributions;
pub mod project_service;
