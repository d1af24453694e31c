//! Widget extension framework.
//!
//! # Responsibility
//! - Declare widget classes and their setting schemas.
//! - Resolve classes from the plugin namespace and apply per-instance
//!   overlays.
//! - Render fragments and dispatch out-of-band interactions.
//!
//! # Invariants
//! - Each render or interaction builds fresh widget objects; nothing is
//!   shared across requests except the read-only registry.
//! - A failing widget degrades to its own error output and never aborts
//!   its siblings.

pub mod class;
pub mod installed;
pub mod instance;
pub mod instantiate;
pub mod interaction;
pub mod registry;
pub mod render;
