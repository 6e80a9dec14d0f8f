//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Route every access to tenant-scoped tables through
//!   [`scoped::ScopedCollection`].
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes run record validation before persistence.
//! - Repository APIs return semantic errors (`NotFound`,
//!   `MultipleMatches`, `ForbiddenMutation`) in addition to DB errors.

pub mod error;
pub mod filter;
pub mod hooks;
pub mod scoped;
pub mod table;
pub mod tenant_repo;
pub mod user_repo;
