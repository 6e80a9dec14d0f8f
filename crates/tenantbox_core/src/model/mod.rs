//! Domain model for tenants and tenant-scoped records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Declare which record types participate in tenant isolation via
//!   the [`scoped::TenantScoped`] trait.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Every tenant-scoped record belongs to exactly one tenant once stored.

pub mod project;
pub mod scoped;
pub mod task;
pub mod tenant;
pub mod user;
pub mod validation;
