//! Unit-of-work binding for the current-tenant context.
//!
//! # Responsibility
//! - Derive the tenant from the actor at the start of a unit of work.
//! - Clear the context exactly once at the end: on return, on `Err`, and
//!   while unwinding from a panic.
//!
//! # Invariants
//! - The guard resets the context in `Drop`, so no exit path skips it.
//! - A nested unit of work hands the enclosing unit's tenant back when it
//!   ends; an outermost unit leaves the context cleared.
//! - The guard is `!Send`; it always resets the thread it was created on.
//! - A thread that finishes its outermost unit of work, however it ended,
//!   starts the next one with no context.

use crate::context::{current_tenant, replace_current_tenant};
use crate::logging::sanitize_message;
use crate::model::tenant::TenantId;
use crate::model::user::Actor;
use log::{debug, error, warn};
use std::any::Any;
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

const MAX_PANIC_MESSAGE_CHARS: usize = 160;

thread_local! {
    /// Number of live guards on this thread.
    static OPEN_UNITS: Cell<usize> = const { Cell::new(0) };
}

/// Failure of a unit of work run through [`run_unit_of_work_catching`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOfWorkError {
    /// The work panicked; carries the sanitized panic message.
    Panicked(String),
}

impl Display for UnitOfWorkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Panicked(message) => write!(f, "unit of work panicked: {message}"),
        }
    }
}

impl Error for UnitOfWorkError {}

/// Holds the current-tenant context for one unit of work.
#[must_use = "the tenant context is reset as soon as the guard is dropped"]
pub struct TenantScopeGuard {
    tenant: Option<TenantId>,
    /// Enclosing unit's tenant, put back on drop.
    restore: Option<TenantId>,
    _not_send: PhantomData<*const ()>,
}

impl TenantScopeGuard {
    /// Tenant this unit of work is scoped to.
    pub fn tenant(&self) -> Option<TenantId> {
        self.tenant
    }
}

impl Drop for TenantScopeGuard {
    fn drop(&mut self) {
        replace_current_tenant(self.restore);
        OPEN_UNITS.with(|open| open.set(open.get().saturating_sub(1)));
        debug!(
            "event=unit_of_work module=binding status=end tenant={} restored_tenant={}",
            display_tenant(self.tenant),
            display_tenant(self.restore)
        );
    }
}

/// Starts a unit of work for `actor`.
///
/// Anonymous actors and actors without a tenant leave the context absent.
///
/// Inside another unit of work the enclosing tenant is saved and restored
/// when the returned guard drops. Outside any unit, a context left behind
/// by an unbound caller is replaced, reported and not restored.
pub fn begin(actor: &Actor) -> TenantScopeGuard {
    let tenant = actor.tenant();
    let previous = replace_current_tenant(tenant);
    let enclosing = OPEN_UNITS.with(|open| {
        let count = open.get();
        open.set(count + 1);
        count
    });

    let restore = if enclosing > 0 {
        previous
    } else {
        if let Some(stale) = previous {
            warn!(
                "event=unit_of_work module=binding status=stale_context_replaced stale_tenant={stale}"
            );
        }
        None
    };
    debug!(
        "event=unit_of_work module=binding status=start authenticated={} tenant={} depth={}",
        actor.is_authenticated(),
        display_tenant(tenant),
        enclosing + 1
    );
    TenantScopeGuard {
        tenant: current_tenant(),
        restore,
        _not_send: PhantomData,
    }
}

/// Runs `work` inside a unit of work for `actor`.
///
/// Panics propagate to the caller after the context has been reset.
pub fn run_unit_of_work<R, F>(actor: &Actor, work: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = begin(actor);
    work()
}

/// Runs `work` inside a unit of work and turns a panic into
/// [`UnitOfWorkError::Panicked`], so a pooled worker can keep serving.
///
/// Uncommitted SQLite transactions opened by `work` roll back when their
/// handles drop during unwinding.
pub fn run_unit_of_work_catching<R, F>(actor: &Actor, work: F) -> Result<R, UnitOfWorkError>
where
    F: FnOnce() -> R,
{
    let guard = begin(actor);
    let outcome = panic::catch_unwind(AssertUnwindSafe(work));
    drop(guard);

    outcome.map_err(|payload| {
        let message = panic_message(payload.as_ref());
        error!("event=unit_of_work module=binding status=panicked payload={message}");
        UnitOfWorkError::Panicked(message)
    })
}

fn display_tenant(tenant: Option<TenantId>) -> String {
    tenant.map_or_else(|| "none".to_string(), |tenant| tenant.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let raw = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };
    sanitize_message(&raw, MAX_PANIC_MESSAGE_CHARS)
}
