//! Tenant-scoped collection over one record type.
//!
//! # Responsibility
//! - Be the only read/write path to tenant-scoped tables.
//! - Inject the current-tenant predicate into every query, update and
//!   delete, and the current tenant into every create.
//! - Offer explicit, distinctly named escape hatches for admin code.
//!
//! # Invariants
//! - An explicit tenant in a [`Filter`] replaces the implicit one; the two
//!   are never intersected.
//! - `update` refuses tenant reassignment before any SQL runs.
//! - `update`/`delete` only touch rows the same query would return.
//! - A record owned by another tenant is reported as `NotFound`, exactly
//!   like a record that does not exist.
//!
//! ```no_run
//! use tenantbox_core::{open_db_in_memory, set_current_tenant, Project, ScopedCollection, TenantId};
//!
//! let conn = open_db_in_memory()?;
//! let projects = ScopedCollection::<Project>::new(&conn);
//! set_current_tenant(TenantId::new());
//! let visible = projects.list_all().fetch()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::UnscopedPolicy;
use crate::context::current_tenant;
use crate::model::tenant::TenantId;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::filter::{render_set, render_where, Changes, Filter, TenantPredicate};
use crate::repo::hooks::{before_create, before_delete};
use crate::repo::table::{select_sql, ScopedTable};
use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::marker::PhantomData;

/// How a collection view derives its tenant predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    /// Follow the current-tenant context.
    Ambient,
    /// No tenant predicate at all. Admin code paths only.
    Unfiltered,
    /// Pinned to one tenant regardless of context.
    Fixed(TenantId),
}

/// Query/command surface for one tenant-scoped record type.
pub struct ScopedCollection<'conn, E> {
    conn: &'conn Connection,
    mode: ScopeMode,
    policy: UnscopedPolicy,
    _record: PhantomData<fn() -> E>,
}

impl<'conn, E: ScopedTable> ScopedCollection<'conn, E> {
    /// Context-following collection over a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            mode: ScopeMode::Ambient,
            policy: UnscopedPolicy::default(),
            _record: PhantomData,
        }
    }

    /// Sets what happens when no current tenant is present.
    pub fn with_policy(mut self, policy: UnscopedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    /// Equivalent view with tenant scoping disabled for everything derived
    /// from it. Every call is logged.
    pub fn without_tenant_filter(&self) -> Self {
        warn!(
            "event=scope_bypass module=repo table={} current_tenant={}",
            E::TABLE,
            display_tenant(current_tenant())
        );
        Self {
            mode: ScopeMode::Unfiltered,
            ..*self
        }
    }

    /// View pinned to `tenant` regardless of the current context. `None`
    /// is the same as [`ScopedCollection::without_tenant_filter`].
    pub fn for_tenant(&self, tenant: Option<&TenantId>) -> Self {
        let Some(tenant) = tenant else {
            return self.without_tenant_filter();
        };
        info!(
            "event=scope_fixed module=repo table={} tenant={} current_tenant={}",
            E::TABLE,
            tenant,
            display_tenant(current_tenant())
        );
        Self {
            mode: ScopeMode::Fixed(*tenant),
            ..*self
        }
    }

    /// Every record visible to this view. Nothing runs until the query is
    /// consumed.
    pub fn list_all(&self) -> Query<'conn, E> {
        self.filter(Filter::new())
    }

    /// Records matching `filter` within this view's scope.
    pub fn filter(&self, filter: Filter) -> Query<'conn, E> {
        let predicate = self.resolve(&filter);
        Query {
            conn: self.conn,
            filter,
            predicate,
            limit: None,
            _record: PhantomData,
        }
    }

    /// Exactly one record matching `filter` within scope.
    pub fn get_one(&self, filter: Filter) -> RepoResult<E> {
        self.filter(filter).get_one()
    }

    pub fn get(&self, id: uuid::Uuid) -> RepoResult<E> {
        self.get_one(Filter::new().id(id))
    }

    /// Inserts `entity`, assigning the scope tenant when it has none.
    pub fn create(&self, mut entity: E) -> RepoResult<E> {
        before_create(&mut entity, self.create_tenant());
        entity.validate()?;
        insert_row(self.conn, &entity)?;
        debug!(
            "event=record_create module=repo status=ok table={} record_id={}",
            E::TABLE,
            entity.id()
        );
        Ok(entity)
    }

    /// Inserts all `entities` in one transaction. Every record without a
    /// tenant receives the same scope tenant.
    pub fn bulk_create(&self, entities: Vec<E>) -> RepoResult<Vec<E>> {
        let scope_tenant = self.create_tenant();
        let mut entities = entities;
        for entity in &mut entities {
            before_create(entity, scope_tenant);
            entity.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        for entity in &entities {
            insert_row(&tx, entity)?;
        }
        tx.commit()?;

        debug!(
            "event=record_bulk_create module=repo status=ok table={} count={}",
            E::TABLE,
            entities.len()
        );
        Ok(entities)
    }

    /// Writes `entity`'s data columns back to its row.
    ///
    /// The row must be visible in this view, and the tenant stored on it
    /// must match `entity`'s; the tenant column itself is never written.
    pub fn save(&self, entity: &E) -> RepoResult<()> {
        entity.validate()?;

        let stored = self.get(entity.id())?;
        let Some(stored_tenant) = stored.tenant().copied() else {
            return Err(RepoError::InvalidData(format!(
                "{} row {} has no tenant",
                E::TABLE,
                entity.id()
            )));
        };
        if entity.tenant() != Some(&stored_tenant) {
            warn!(
                "event=forbidden_mutation module=repo op=save status=refused table={} record_id={}",
                E::TABLE,
                entity.id()
            );
            return Err(RepoError::ForbiddenMutation(
                "tenant reference cannot be changed through save".to_string(),
            ));
        }

        let assignments = E::COLUMNS
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut binds = entity.column_values();
        binds.push(Value::Text(entity.id().to_string()));
        binds.push(Value::Text(stored_tenant.to_string()));

        let sql = format!(
            "UPDATE {} SET {assignments} WHERE id = ? AND tenant_id = ?",
            E::TABLE
        );
        let changed = self.conn.execute(&sql, params_from_iter(binds))?;
        if changed == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    /// Deletes one record after the delete hook approves it.
    pub fn delete_entity(&self, entity: &E) -> RepoResult<()> {
        before_delete(entity)?;
        let deleted = self.filter(Filter::new().id(entity.id())).delete()?;
        if deleted == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    fn resolve(&self, filter: &Filter) -> TenantPredicate {
        if let Some(tenant) = filter.explicit_tenant() {
            return TenantPredicate::Only(*tenant);
        }
        match self.mode {
            ScopeMode::Unfiltered => TenantPredicate::Any,
            ScopeMode::Fixed(tenant) => TenantPredicate::Only(tenant),
            ScopeMode::Ambient => match (current_tenant(), self.policy) {
                (Some(tenant), _) => TenantPredicate::Only(tenant),
                (None, UnscopedPolicy::Unrestricted) => TenantPredicate::Any,
                (None, UnscopedPolicy::DenyAll) => TenantPredicate::Nothing,
            },
        }
    }

    fn create_tenant(&self) -> Option<TenantId> {
        match self.mode {
            ScopeMode::Fixed(tenant) => Some(tenant),
            ScopeMode::Ambient | ScopeMode::Unfiltered => current_tenant(),
        }
    }
}

/// Lazily evaluated, tenant-scoped query.
///
/// The tenant predicate is resolved when the query is built; consuming it
/// later runs exactly that predicate.
pub struct Query<'conn, E> {
    conn: &'conn Connection,
    filter: Filter,
    predicate: TenantPredicate,
    limit: Option<u32>,
    _record: PhantomData<fn() -> E>,
}

impl<'conn, E: ScopedTable> Query<'conn, E> {
    /// Narrows the query. An explicit tenant in `extra` replaces the
    /// query's tenant predicate.
    pub fn filter(mut self, extra: Filter) -> Self {
        if let Some(tenant) = extra.explicit_tenant() {
            self.predicate = TenantPredicate::Only(*tenant);
        }
        self.filter = self.filter.merge(extra);
        self
    }

    /// Caps the number of rows returned by reads.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn predicate(&self) -> TenantPredicate {
        self.predicate
    }

    /// Runs the query, in the record type's declared order.
    pub fn fetch(&self) -> RepoResult<Vec<E>> {
        let (where_sql, mut binds) = render_where(&self.filter, self.predicate, E::COLUMNS)?;
        let mut sql = format!(
            "{} WHERE {where_sql} ORDER BY {}, id ASC",
            select_sql::<E>(),
            E::ORDER_BY
        );
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(E::from_row(row)?);
        }
        Ok(records)
    }

    pub fn first(&self) -> RepoResult<Option<E>> {
        Ok(self.limited(1).fetch()?.into_iter().next())
    }

    /// Number of matching rows, ignoring `limit`.
    pub fn count(&self) -> RepoResult<usize> {
        let (where_sql, binds) = render_where(&self.filter, self.predicate, E::COLUMNS)?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {where_sql}", E::TABLE);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(binds), |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("invalid row count {count}")))
    }

    pub fn exists(&self) -> RepoResult<bool> {
        Ok(self.first()?.is_some())
    }

    /// The single matching record.
    ///
    /// # Errors
    /// - `NotFound` when nothing matches within scope.
    /// - `MultipleMatches` when more than one record matches.
    pub fn get_one(&self) -> RepoResult<E> {
        let mut matches = self.limited(2).fetch()?;
        match matches.len() {
            0 => Err(RepoError::NotFound),
            1 => matches.pop().ok_or(RepoError::NotFound),
            _ => Err(RepoError::MultipleMatches(self.count()?)),
        }
    }

    /// Applies `changes` to every matching row and returns the row count.
    ///
    /// # Errors
    /// - `ForbiddenMutation` when `changes` touches `tenant_id`; nothing is
    ///   written.
    pub fn update(&self, changes: &Changes) -> RepoResult<usize> {
        if changes.touches_tenant() {
            warn!(
                "event=forbidden_mutation module=repo op=update status=refused table={} current_tenant={}",
                E::TABLE,
                display_tenant(current_tenant())
            );
        }
        let (set_sql, mut binds) = render_set(changes, E::COLUMNS)?;
        if changes.is_empty() {
            return Ok(0);
        }
        let (where_sql, where_binds) = render_where(&self.filter, self.predicate, E::COLUMNS)?;
        binds.extend(where_binds);

        let sql = format!("UPDATE {} SET {set_sql} WHERE {where_sql}", E::TABLE);
        Ok(self.conn.execute(&sql, params_from_iter(binds))?)
    }

    /// Deletes every matching row and returns the row count.
    pub fn delete(&self) -> RepoResult<usize> {
        let (where_sql, binds) = render_where(&self.filter, self.predicate, E::COLUMNS)?;
        let sql = format!("DELETE FROM {} WHERE {where_sql}", E::TABLE);
        let deleted = self.conn.execute(&sql, params_from_iter(binds))?;
        debug!(
            "event=record_delete module=repo status=ok table={} count={}",
            E::TABLE,
            deleted
        );
        Ok(deleted)
    }

    fn limited(&self, limit: u32) -> Self {
        Self {
            conn: self.conn,
            filter: self.filter.clone(),
            predicate: self.predicate,
            limit: Some(limit),
            _record: PhantomData,
        }
    }
}

fn insert_row<E: ScopedTable>(conn: &Connection, entity: &E) -> RepoResult<()> {
    let mut columns = vec!["id", "tenant_id"];
    columns.extend_from_slice(E::COLUMNS);
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        E::TABLE,
        columns.join(", ")
    );

    let mut binds = Vec::with_capacity(columns.len());
    binds.push(Value::Text(entity.id().to_string()));
    binds.push(
        entity
            .tenant()
            .map_or(Value::Null, |tenant| Value::Text(tenant.to_string())),
    );
    binds.extend(entity.column_values());

    conn.execute(&sql, params_from_iter(binds))?;
    Ok(())
}

fn display_tenant(tenant: Option<TenantId>) -> String {
    tenant.map_or_else(|| "none".to_string(), |tenant| tenant.to_string())
}
