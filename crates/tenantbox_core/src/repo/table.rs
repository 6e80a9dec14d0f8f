//! Row mapping for tenant-scoped tables.
//!
//! # Responsibility
//! - Map each [`TenantScoped`] record type to its table, columns and
//!   ordering.
//! - Keep SQL row parsing inside the repository boundary.
//!
//! # Invariants
//! - `id` and `tenant_id` are handled by the collection, never listed in
//!   `COLUMNS`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::project::Project;
use crate::model::scoped::TenantScoped;
use crate::model::task::Task;
use crate::model::tenant::TenantId;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

/// Storage mapping for a tenant-scoped record type.
pub trait ScopedTable: TenantScoped + Sized {
    const TABLE: &'static str;
    /// Data columns besides `id` and `tenant_id`, in bind order.
    const COLUMNS: &'static [&'static str];
    const ORDER_BY: &'static str;

    /// Builds a record from a row selected as `id, tenant_id, COLUMNS...`.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Values for `COLUMNS`, in the same order.
    fn column_values(&self) -> Vec<Value>;
}

impl ScopedTable for Project {
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static [&'static str] = &["name"];
    const ORDER_BY: &'static str = "name ASC";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: parse_uuid_column(row, "id", Self::TABLE)?,
            tenant: Some(parse_tenant_column(row, Self::TABLE)?),
            name: row.get("name")?,
        })
    }

    fn column_values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone())]
    }
}

impl ScopedTable for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &["project_id", "title", "is_done"];
    const ORDER_BY: &'static str = "title ASC";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: parse_uuid_column(row, "id", Self::TABLE)?,
            tenant: Some(parse_tenant_column(row, Self::TABLE)?),
            project_id: parse_uuid_column(row, "project_id", Self::TABLE)?,
            title: row.get("title")?,
            is_done: parse_bool_column(row, "is_done", Self::TABLE)?,
        })
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.project_id.to_string()),
            Value::Text(self.title.clone()),
            Value::Integer(i64::from(self.is_done)),
        ]
    }
}

/// `SELECT id, tenant_id, <columns> FROM <table>` for `E`.
pub(crate) fn select_sql<E: ScopedTable>() -> String {
    let mut columns = vec!["id", "tenant_id"];
    columns.extend_from_slice(E::COLUMNS);
    format!("SELECT {} FROM {}", columns.join(", "), E::TABLE)
}

pub(crate) fn parse_uuid_column(row: &Row<'_>, column: &str, table: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

pub(crate) fn parse_tenant_column(row: &Row<'_>, table: &str) -> RepoResult<TenantId> {
    parse_uuid_column(row, "tenant_id", table).map(TenantId::from_uuid)
}

fn parse_bool_column(row: &Row<'_>, column: &str, table: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {table}.{column}"
        ))),
    }
}
