//! Task domain model.
//!
//! # Invariants
//! - A task's tenant equals the tenant of its project. Storage does not
//!   enforce this; the project service checks it on create and
//!   `service::consistency` audits it.

use crate::model::project::ProjectId;
use crate::model::scoped::TenantScoped;
use crate::model::tenant::TenantId;
use crate::model::validation::{validate_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub tenant: Option<TenantId>,
    pub project_id: ProjectId,
    pub title: String,
    pub is_done: bool,
}

impl Task {
    /// New open task without a tenant.
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant: None,
            project_id,
            title: title.into(),
            is_done: false,
        }
    }

    /// Flips completion state.
    pub fn toggle(&mut self) {
        self.is_done = !self.is_done;
    }
}

impl TenantScoped for Task {
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
        validate_name("task.title", &self.title)
    }
}
