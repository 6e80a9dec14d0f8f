//! Compile-time marker for records that participate in tenant isolation.
//!
//! # Invariants
//! - A type implementing [`TenantScoped`] is stored with a mandatory
//!   `tenant_id` column.
//! - `tenant()` returning `None` only means "not assigned yet"; the create
//!   hook or the storage constraint resolves it before the row exists.

use crate::model::tenant::TenantId;
use crate::model::validation::ValidationError;
use uuid::Uuid;

/// Record type owned by exactly one tenant.
pub trait TenantScoped {
    /// Stable record id.
    fn id(&self) -> Uuid;
    /// Owning tenant, if already assigned.
    fn tenant(&self) -> Option<&TenantId>;
    /// Assigns the owning tenant. Only the create hook and explicit
    /// construction paths call this.
    fn set_tenant(&mut self, tenant: TenantId);
    /// Field validation run before every write.
    fn validate(&self) -> Result<(), ValidationError>;
}
