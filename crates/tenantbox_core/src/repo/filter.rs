//! Predicates and change sets accepted by scoped collections.
//!
//! # Responsibility
//! - Describe caller predicates (`Filter`) and column assignments
//!   (`Changes`) without exposing SQL text to callers.
//! - Render them into parameterized SQL fragments.
//!
//! # Invariants
//! - Column names are checked against the table's declared columns
//!   before they reach SQL; values are always bound, never interpolated.
//! - A tenant predicate written into a `Filter` is the explicit tenant;
//!   the last one written wins.

use crate::model::tenant::TenantId;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use uuid::Uuid;

pub const ID_COLUMN: &str = "id";
pub const TENANT_COLUMN: &str = "tenant_id";
/// Model field name for the tenant reference; accepted wherever
/// `TENANT_COLUMN` is.
pub const TENANT_FIELD: &str = "tenant";

/// Bindable column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Uuid(Uuid),
}

impl FieldValue {
    fn as_tenant(&self) -> Option<TenantId> {
        match self {
            Self::Uuid(value) => Some(TenantId::from_uuid(*value)),
            Self::Text(value) => TenantId::parse(value),
            Self::Integer(_) | Self::Bool(_) => None,
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(text) => Value::Text(text),
            FieldValue::Integer(number) => Value::Integer(number),
            FieldValue::Bool(flag) => Value::Integer(i64::from(flag)),
            FieldValue::Uuid(uuid) => Value::Text(uuid.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<TenantId> for FieldValue {
    fn from(value: TenantId) -> Self {
        Self::Uuid(*value.as_uuid())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Eq { column: String, value: FieldValue },
    Contains { column: String, needle: String },
}

/// Caller predicate for `filter`/`get_one`.
///
/// ```
/// use tenantbox_core::Filter;
///
/// let filter = Filter::new().eq("name", "Roadmap").contains("name", "road");
/// assert!(filter.explicit_tenant().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
    tenant: Option<TenantId>,
    invalid_tenant: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches the record with this id.
    pub fn id(self, id: Uuid) -> Self {
        self.eq(ID_COLUMN, id)
    }

    /// Equality on a declared column. An equality on `tenant_id` (or
    /// `tenant`) is the same as [`Filter::tenant`].
    pub fn eq(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        if is_tenant_column(column) {
            match value.as_tenant() {
                Some(tenant) => {
                    self.tenant = Some(tenant);
                    self.invalid_tenant = None;
                }
                None => self.invalid_tenant = Some(format!("{value:?}")),
            }
            return self;
        }
        self.conditions.push(Condition::Eq {
            column: column.to_string(),
            value,
        });
        self
    }

    /// ASCII case-insensitive substring match on a declared text column.
    pub fn contains(mut self, column: &str, needle: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains {
            column: column.to_string(),
            needle: needle.into(),
        });
        self
    }

    /// Explicit tenant predicate. Suppresses the implicit context-derived
    /// predicate for whatever query this filter is applied to.
    pub fn tenant(mut self, tenant: TenantId) -> Self {
        self.tenant = Some(tenant);
        self.invalid_tenant = None;
        self
    }

    pub fn explicit_tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    /// Appends `other`'s conditions; its explicit tenant, if any, replaces
    /// ours.
    pub(crate) fn merge(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        if other.tenant.is_some() || other.invalid_tenant.is_some() {
            self.tenant = other.tenant;
            self.invalid_tenant = other.invalid_tenant;
        }
        self
    }
}

/// Tenant restriction a query runs under, after explicit/implicit
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantPredicate {
    /// No tenant restriction (admin view, or no context under the
    /// unrestricted policy).
    Any,
    Only(TenantId),
    /// Matches no rows (no context under the deny-all policy).
    Nothing,
}

impl TenantPredicate {
    pub fn tenant(&self) -> Option<TenantId> {
        match self {
            Self::Only(tenant) => Some(*tenant),
            Self::Any | Self::Nothing => None,
        }
    }
}

/// Column assignments for a bulk `update`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    assignments: Vec<(String, FieldValue)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.assignments.push((column.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Returns whether any assignment targets the tenant reference.
    pub fn touches_tenant(&self) -> bool {
        self.assignments
            .iter()
            .any(|(column, _)| is_tenant_column(column))
    }
}

fn is_tenant_column(column: &str) -> bool {
    column == TENANT_COLUMN || column == TENANT_FIELD
}

/// Renders `WHERE` conditions for `filter` under `predicate`.
///
/// Returns the condition text (without the `WHERE` keyword) and the
/// values to bind, in order.
pub(crate) fn render_where(
    filter: &Filter,
    predicate: TenantPredicate,
    columns: &[&str],
) -> RepoResult<(String, Vec<Value>)> {
    if let Some(raw) = &filter.invalid_tenant {
        return Err(RepoError::InvalidData(format!(
            "tenant predicate value {raw} is not a tenant id"
        )));
    }

    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    match predicate {
        TenantPredicate::Any => {}
        TenantPredicate::Only(tenant) => {
            clauses.push(format!("{TENANT_COLUMN} = ?"));
            binds.push(Value::Text(tenant.to_string()));
        }
        TenantPredicate::Nothing => clauses.push("0 = 1".to_string()),
    }

    for condition in &filter.conditions {
        match condition {
            Condition::Eq { column, value } => {
                let column = checked_column(column, columns)?;
                clauses.push(format!("{column} = ?"));
                binds.push(value.clone().into());
            }
            Condition::Contains { column, needle } => {
                let column = checked_column(column, columns)?;
                clauses.push(format!("{column} LIKE ? ESCAPE '\\'"));
                binds.push(Value::Text(format!("%{}%", escape_like(needle))));
            }
        }
    }

    if clauses.is_empty() {
        return Ok(("1 = 1".to_string(), binds));
    }
    Ok((clauses.join(" AND "), binds))
}

/// Renders the `SET` list for `changes`.
///
/// Refuses tenant reassignment outright; `id` is immutable too.
pub(crate) fn render_set(changes: &Changes, columns: &[&str]) -> RepoResult<(String, Vec<Value>)> {
    if changes.touches_tenant() {
        return Err(RepoError::ForbiddenMutation(
            "tenant reference cannot be changed through update".to_string(),
        ));
    }

    let mut assignments = Vec::with_capacity(changes.assignments.len());
    let mut binds = Vec::with_capacity(changes.assignments.len());
    for (column, value) in &changes.assignments {
        if column == ID_COLUMN {
            return Err(RepoError::InvalidData("id is immutable".to_string()));
        }
        let column = checked_column(column, columns)?;
        assignments.push(format!("{column} = ?"));
        binds.push(value.clone().into());
    }
    Ok((assignments.join(", "), binds))
}

fn checked_column<'a>(column: &str, columns: &[&'a str]) -> RepoResult<&'a str> {
    if column == ID_COLUMN {
        return Ok(ID_COLUMN);
    }
    columns
        .iter()
        .copied()
        .find(|known| *known == column)
        .ok_or_else(|| RepoError::InvalidData(format!("unknown column `{column}`")))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{render_set, render_where, Changes, Filter, TenantPredicate};
    use crate::model::tenant::TenantId;
    use crate::repo::error::RepoError;
    use rusqlite::types::Value;

    const COLUMNS: &[&str] = &["name"];

    #[test]
    fn empty_filter_without_tenant_matches_everything() {
        let (sql, binds) = render_where(&Filter::new(), TenantPredicate::Any, COLUMNS).unwrap();
        assert_eq!(sql, "1 = 1");
        assert!(binds.is_empty());
    }

    #[test]
    fn tenant_predicate_comes_first_and_is_bound() {
        let tenant = TenantId::new();
        let filter = Filter::new().eq("name", "alpha");
        let (sql, binds) = render_where(&filter, TenantPredicate::Only(tenant), COLUMNS).unwrap();

        assert_eq!(sql, "tenant_id = ? AND name = ?");
        assert_eq!(
            binds,
            vec![
                Value::Text(tenant.to_string()),
                Value::Text("alpha".to_string())
            ]
        );
    }

    #[test]
    fn deny_all_predicate_renders_false_condition() {
        let (sql, _) = render_where(&Filter::new(), TenantPredicate::Nothing, COLUMNS).unwrap();
        assert_eq!(sql, "0 = 1");
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let filter = Filter::new().eq("name; DROP TABLE projects", "x");
        let err = render_where(&filter, TenantPredicate::Any, COLUMNS).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn contains_escapes_like_wildcards() {
        let filter = Filter::new().contains("name", "50%_off");
        let (sql, binds) = render_where(&filter, TenantPredicate::Any, COLUMNS).unwrap();
        assert_eq!(sql, "name LIKE ? ESCAPE '\\'");
        assert_eq!(binds, vec![Value::Text("%50\\%\\_off%".to_string())]);
    }

    #[test]
    fn tenant_equality_becomes_explicit_tenant_and_last_value_wins() {
        let first = TenantId::new();
        let second = TenantId::new();
        let filter = Filter::new()
            .eq("tenant_id", first)
            .eq("tenant_id", second.to_string());
        assert_eq!(filter.explicit_tenant(), Some(&second));
    }

    #[test]
    fn malformed_tenant_equality_is_invalid_data() {
        let filter = Filter::new().eq("tenant_id", "not-a-uuid");
        let err = render_where(&filter, TenantPredicate::Any, COLUMNS).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn merge_keeps_conditions_and_prefers_later_tenant() {
        let first = TenantId::new();
        let second = TenantId::new();
        let merged = Filter::new()
            .tenant(first)
            .eq("name", "a")
            .merge(Filter::new().tenant(second).eq("name", "b"));
        assert_eq!(merged.explicit_tenant(), Some(&second));

        let (sql, _) = render_where(&merged, TenantPredicate::Any, COLUMNS).unwrap();
        assert_eq!(sql, "name = ? AND name = ?");
    }

    #[test]
    fn set_refuses_tenant_changes() {
        let changes = Changes::new()
            .set("name", "renamed")
            .set("tenant_id", TenantId::new());
        let err = render_set(&changes, COLUMNS).unwrap_err();
        assert!(matches!(err, RepoError::ForbiddenMutation(_)));
    }

    #[test]
    fn tenant_field_name_is_an_alias_of_the_column() {
        let tenant = TenantId::new();
        let filter = Filter::new().eq("tenant", tenant);
        assert_eq!(filter.explicit_tenant(), Some(&tenant));

        let changes = Changes::new().set("tenant", tenant);
        assert!(changes.touches_tenant());
        let err = render_set(&changes, COLUMNS).unwrap_err();
        assert!(matches!(err, RepoError::ForbiddenMutation(_)));
    }

    #[test]
    fn set_refuses_id_changes() {
        let changes = Changes::new().set("id", uuid::Uuid::new_v4());
        let err = render_set(&changes, COLUMNS).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn set_binds_values_in_order() {
        let changes = Changes::new().set("name", "renamed");
        let (sql, binds) = render_set(&changes, COLUMNS).unwrap();
        assert_eq!(sql, "name = ?");
        assert_eq!(binds, vec![Value::Text("renamed".to_string())]);
    }
}
