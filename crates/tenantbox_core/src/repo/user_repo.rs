//! User repository contracts and SQLite implementation.
//!
//! Users are system-owned: the repository is not tenant-scoped, because
//! unit-of-work binding needs the user before any tenant is known.

use crate::model::tenant::TenantId;
use crate::model::user::User;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::table::parse_uuid_column;
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, username, tenant_id FROM users";

/// Repository interface for user records.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<()>;
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;
        self.conn.execute(
            "INSERT INTO users (id, username, tenant_id) VALUES (?1, ?2, ?3);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.tenant.map(|tenant| tenant.to_string()),
            ],
        )?;
        Ok(())
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE username = ?1;"),
                [username],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?;
        user.transpose()
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let tenant = match row.get::<_, Option<String>>("tenant_id")? {
        Some(text) => Some(TenantId::parse(&text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid uuid value `{text}` in users.tenant_id"))
        })?),
        None => None,
    };

    Ok(User {
        id: parse_uuid_column(row, "id", "users")?,
        username: row.get("username")?,
        tenant,
    })
}
