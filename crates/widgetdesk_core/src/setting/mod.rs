//! Widget setting model.
//!
//! # Responsibility
//! - Define typed setting descriptors and their constrained variants.
//! - Provide the admin form helpers that render and validate settings.
//!
//! # Invariants
//! - Descriptor shape (key/default/pattern/required/description) is fixed at
//!   construction; only `value` changes afterwards.
//! - Validation of submitted text lives in `form`, not in the descriptor.

pub mod descriptor;
pub mod form;
