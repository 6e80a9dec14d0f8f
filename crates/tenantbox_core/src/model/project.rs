//! Project domain model.

use crate::model::scoped::TenantScoped;
use crate::model::tenant::TenantId;
use crate::model::validation::{validate_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// `None` until assigned by the create hook or the caller.
    pub tenant: Option<TenantId>,
    pub name: String,
}

impl Project {
    /// New project without a tenant; the scoped collection assigns one.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant: None,
            name: name.into(),
        }
    }

    /// New project explicitly bound to `tenant`.
    pub fn for_tenant(tenant: TenantId, name: impl Into<String>) -> Self {
        Self {
            tenant: Some(tenant),
            ..Self::new(name)
        }
    }
}

impl TenantScoped for Project {
    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    fn set_tenant(&mut self, tenant: TenantId) {
        self.tenant = Some(tenant);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_name("project.name", &self.name)
    }
}
