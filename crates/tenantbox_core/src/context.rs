//! Current-tenant context store.
//!
//! # Responsibility
//! - Hold the tenant the executing unit of work is scoped to.
//!
//! # Invariants
//! - Storage is thread-local: concurrently running units of work never
//!   observe each other's tenant.
//! - Reading an unset slot yields `None`, never an error.
//! - Nothing here is persisted.
//!
//! Callers normally go through [`crate::binding`] instead of setting the
//! slot by hand, so the clear step cannot be forgotten.

use crate::model::tenant::TenantId;
use std::cell::Cell;

thread_local! {
    static CURRENT_TENANT: Cell<Option<TenantId>> = const { Cell::new(None) };
}

/// Sets the tenant for the current thread, replacing any previous value.
pub fn set_current_tenant(tenant: TenantId) {
    CURRENT_TENANT.with(|slot| slot.set(Some(tenant)));
}

/// Returns the tenant for the current thread, if one is set.
pub fn current_tenant() -> Option<TenantId> {
    CURRENT_TENANT.with(Cell::get)
}

/// Clears the tenant for the current thread. Clearing an unset slot is a
/// no-op.
pub fn clear_current_tenant() {
    CURRENT_TENANT.with(|slot| slot.set(None));
}

/// Swaps in `tenant` and returns the previous value. The binding layer
/// uses it to detect a context left behind by an unbound caller.
pub(crate) fn replace_current_tenant(tenant: Option<TenantId>) -> Option<TenantId> {
    CURRENT_TENANT.with(|slot| slot.replace(tenant))
}

#[cfg(test)]
mod tests {
    use super::{clear_current_tenant, current_tenant, replace_current_tenant, set_current_tenant};
    use crate::model::tenant::TenantId;
    use std::thread;

    #[test]
    fn unset_context_reads_as_none() {
        clear_current_tenant();
        assert_eq!(current_tenant(), None);
    }

    #[test]
    fn set_then_clear_roundtrip() {
        let tenant = TenantId::new();
        set_current_tenant(tenant);
        assert_eq!(current_tenant(), Some(tenant));

        clear_current_tenant();
        assert_eq!(current_tenant(), None);
        clear_current_tenant();
        assert_eq!(current_tenant(), None);
    }

    #[test]
    fn replace_returns_previous_value() {
        let first = TenantId::new();
        let second = TenantId::new();
        set_current_tenant(first);

        assert_eq!(replace_current_tenant(Some(second)), Some(first));
        assert_eq!(current_tenant(), Some(second));
        assert_eq!(replace_current_tenant(None), Some(second));
        assert_eq!(current_tenant(), None);
    }

    #[test]
    fn other_threads_do_not_observe_context() {
        let tenant = TenantId::new();
        set_current_tenant(tenant);

        let seen_by_other = thread::spawn(current_tenant)
            .join()
            .expect("probe thread should not panic");
        assert_eq!(seen_by_other, None);
        assert_eq!(current_tenant(), Some(tenant));

        clear_current_tenant();
    }
}
