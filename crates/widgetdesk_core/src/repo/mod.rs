//! Repository layer for widget placements.
//!
//! # Responsibility
//! - Define the load/save contract the widget core consumes.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod instance_repo;
