//! Use-case services over the placement store and widget registry.
//!
//! # Responsibility
//! - Orchestrate repository calls with widget instantiation and rendering.
//!
//! # Invariants
//! - Services never bypass repository persistence contracts.

pub mod widget_service;
