//! Per-instance lifecycle hooks for tenant-scoped records.
//!
//! # Invariants
//! - Create never overwrites a tenant the caller already set.
//! - Delete is refused whenever a current tenant is set and the record
//!   belongs elsewhere, regardless of how the caller reached the record.

use crate::context::current_tenant;
use crate::model::scoped::TenantScoped;
use crate::model::tenant::TenantId;
use crate::repo::error::{RepoError, RepoResult};
use log::warn;

/// Assigns `scope_tenant` to a record that has no tenant yet.
///
/// A record that stays unassigned is left for the storage `NOT NULL`
/// constraint to reject.
pub fn before_create<E: TenantScoped>(entity: &mut E, scope_tenant: Option<TenantId>) {
    if entity.tenant().is_some() {
        return;
    }
    if let Some(tenant) = scope_tenant {
        entity.set_tenant(tenant);
    }
}

/// Verifies that `entity` belongs to the current tenant before deletion.
pub fn before_delete<E: TenantScoped>(entity: &E) -> RepoResult<()> {
    let Some(current) = current_tenant() else {
        return Ok(());
    };
    if entity.tenant() == Some(&current) {
        return Ok(());
    }

    let owner = entity
        .tenant()
        .map_or_else(|| "none".to_string(), ToString::to_string);
    warn!(
        "event=forbidden_mutation module=repo op=delete status=refused record_id={} record_tenant={} current_tenant={}",
        entity.id(),
        owner,
        current
    );
    Err(RepoError::ForbiddenMutation(format!(
        "cannot delete record owned by tenant {owner} while current tenant is {current}"
    )))
}
