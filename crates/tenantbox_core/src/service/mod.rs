//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate scoped collections into use-case level APIs.
//! - Keep calling layers unaware of tenant scoping: services never take a
//!   tenant argument on the ordinary path.

pub mod consistency;
pub mod project_service;
pub mod sample_data;
