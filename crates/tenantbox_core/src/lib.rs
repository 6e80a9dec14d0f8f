//! Core of tenantbox: automatic multi-tenant isolation over SQLite.
//!
//! Every access to a tenant-scoped table goes through a
//! [`ScopedCollection`], which reads the current tenant from the
//! thread-local [`context`] store and injects it into queries and
//! creates. [`binding`] ties that context to a unit of work.

pub mod binding;
pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use binding::{
    begin, run_unit_of_work, run_unit_of_work_catching, TenantScopeGuard, UnitOfWorkError,
};
pub use config::{CoreConfig, UnscopedPolicy};
pub use context::{clear_current_tenant, current_tenant, set_current_tenant};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::project::{Project, ProjectId};
pub use model::scoped::TenantScoped;
pub use model::task::{Task, TaskId};
pub use model::tenant::{Tenant, TenantId};
pub use model::user::{Actor, User, UserId};
pub use model::validation::ValidationError;
pub use repo::error::{RepoError, RepoResult};
pub use repo::filter::{Changes, FieldValue, Filter, TenantPredicate};
pub use repo::scoped::{Query, ScopeMode, ScopedCollection};
pub use repo::table::ScopedTable;
pub use repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use service::consistency::{find_cross_tenant_tasks, CrossTenantTask};
pub use service::project_service::{
    ProjectService, SearchResults, ServiceError, ServiceResult, TaskCounts,
};
pub use service::sample_data::{seed_sample_data, SampleData};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
