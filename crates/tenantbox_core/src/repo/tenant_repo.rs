//! Tenant repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist and look up tenants (system-owned isolation boundaries).
//!
//! # Invariants
//! - Tenants are not tenant-scoped; this repository never consults the
//!   current-tenant context.
//! - Lists are ordered by `name ASC, id ASC`.

use crate::model::tenant::{Tenant, TenantId};
use crate::repo::error::RepoResult;
use crate::repo::table::parse_uuid_column;
use rusqlite::{params, Connection, OptionalExtension, Row};

const TENANT_SELECT_SQL: &str = "SELECT id, name, created_at FROM tenants";

/// Repository interface for tenant records.
pub trait TenantRepository {
    fn create_tenant(&self, tenant: &Tenant) -> RepoResult<TenantId>;
    fn get_tenant(&self, id: TenantId) -> RepoResult<Option<Tenant>>;
    /// First tenant with exactly this name, if any.
    fn find_tenant_by_name(&self, name: &str) -> RepoResult<Option<Tenant>>;
    fn list_tenants(&self) -> RepoResult<Vec<Tenant>>;
}

/// SQLite-backed tenant repository.
pub struct SqliteTenantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTenantRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TenantRepository for SqliteTenantRepository<'_> {
    fn create_tenant(&self, tenant: &Tenant) -> RepoResult<TenantId> {
        tenant.validate()?;
        self.conn.execute(
            "INSERT INTO tenants (id, name, created_at) VALUES (?1, ?2, ?3);",
            params![tenant.id.to_string(), tenant.name.as_str(), tenant.created_at],
        )?;
        Ok(tenant.id)
    }

    fn get_tenant(&self, id: TenantId) -> RepoResult<Option<Tenant>> {
        let tenant = self
            .conn
            .query_row(
                &format!("{TENANT_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_tenant_row(row)),
            )
            .optional()?;
        tenant.transpose()
    }

    fn find_tenant_by_name(&self, name: &str) -> RepoResult<Option<Tenant>> {
        let tenant = self
            .conn
            .query_row(
                &format!("{TENANT_SELECT_SQL} WHERE name = ?1 ORDER BY id ASC LIMIT 1;"),
                [name],
                |row| Ok(parse_tenant_row(row)),
            )
            .optional()?;
        tenant.transpose()
    }

    fn list_tenants(&self) -> RepoResult<Vec<Tenant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TENANT_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tenants = Vec::new();
        while let Some(row) = rows.next()? {
            tenants.push(parse_tenant_row(row)?);
        }
        Ok(tenants)
    }
}

fn parse_tenant_row(row: &Row<'_>) -> RepoResult<Tenant> {
    Ok(Tenant {
        id: TenantId::from_uuid(parse_uuid_column(row, "id", "tenants")?),
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
