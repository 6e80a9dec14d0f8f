//! Repository error taxonomy.
//!
//! # Invariants
//! - `NotFound` carries no hint about rows owned by other tenants.
//! - Storage failures (including constraint violations) pass through as
//!   `Db` without being rewritten.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// Single-record fetch matched nothing after tenant scoping.
    NotFound,
    /// Single-record fetch matched this many records after scoping.
    MultipleMatches(usize),
    /// Attempt to change a tenant reference or to act outside the
    /// current tenant.
    ForbiddenMutation(String),
    InvalidData(String),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::ForbiddenMutation(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_constraint_violation())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound => write!(f, "record not found"),
            Self::MultipleMatches(count) => {
                write!(f, "expected exactly one record, found {count}")
            }
            Self::ForbiddenMutation(message) => write!(f, "forbidden mutation: {message}"),
            Self::InvalidData(message) => write!(f, "invalid data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound
            | Self::MultipleMatches(_)
            | Self::ForbiddenMutation(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
