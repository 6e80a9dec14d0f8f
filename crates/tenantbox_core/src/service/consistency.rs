//! Admin audit for referential tenant consistency.
//!
//! Storage does not stop a task from pointing at a project owned by
//! another tenant; this audit finds such rows across all tenants.

use crate::model::project::ProjectId;
use crate::model::task::TaskId;
use crate::model::tenant::TenantId;
use crate::repo::error::RepoResult;
use crate::repo::table::parse_uuid_column;
use log::{info, warn};
use rusqlite::Connection;

/// One task whose tenant differs from its project's tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossTenantTask {
    pub task_id: TaskId,
    pub task_tenant: TenantId,
    pub project_id: ProjectId,
    pub project_tenant: TenantId,
}

/// Lists every task/project tenant mismatch, ordered by task id.
///
/// Runs unscoped by construction; call it from admin tooling only.
pub fn find_cross_tenant_tasks(conn: &Connection) -> RepoResult<Vec<CrossTenantTask>> {
    let mut stmt = conn.prepare(
        "SELECT
            t.id AS task_id,
            t.tenant_id AS task_tenant,
            p.id AS project_id,
            p.tenant_id AS project_tenant
         FROM tasks t
         JOIN projects p ON p.id = t.project_id
         WHERE t.tenant_id <> p.tenant_id
         ORDER BY t.id ASC;",
    )?;

    let mut rows = stmt.query([])?;
    let mut mismatches = Vec::new();
    while let Some(row) = rows.next()? {
        mismatches.push(CrossTenantTask {
            task_id: parse_uuid_column(row, "task_id", "tasks")?,
            task_tenant: TenantId::from_uuid(parse_uuid_column(row, "task_tenant", "tasks")?),
            project_id: parse_uuid_column(row, "project_id", "projects")?,
            project_tenant: TenantId::from_uuid(parse_uuid_column(
                row,
                "project_tenant",
                "projects",
            )?),
        });
    }

    if mismatches.is_empty() {
        info!("event=consistency_audit module=service status=ok mismatches=0");
    } else {
        warn!(
            "event=consistency_audit module=service status=mismatch mismatches={}",
            mismatches.len()
        );
    }
    Ok(mismatches)
}
