//! Users and the authenticated actor view used by unit-of-work binding.

use crate::model::tenant::TenantId;
use crate::model::validation::{validate_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// Stored user account. A user without a tenant can still authenticate
/// but never receives a tenant context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub tenant: Option<TenantId>,
}

impl User {
    pub fn new(username: impl Into<String>, tenant: Option<TenantId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            tenant,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("user.username", &self.username)
    }
}

/// Identity attached to one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    user_id: Option<UserId>,
    username: Option<String>,
    tenant: Option<TenantId>,
}

impl Actor {
    /// Unauthenticated caller; never carries a tenant.
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            username: None,
            tenant: None,
        }
    }

    /// Authenticated actor for the given user.
    pub fn authenticated(user: &User) -> Self {
        Self {
            user_id: Some(user.id),
            username: Some(user.username.clone()),
            tenant: user.tenant,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Tenant the unit of work should be scoped to. Anonymous actors and
    /// users without a tenant yield `None`.
    pub fn tenant(&self) -> Option<TenantId> {
        if self.is_authenticated() {
            self.tenant
        } else {
            None
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::authenticated(user)
    }
}
