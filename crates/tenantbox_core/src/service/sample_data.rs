//! Sample tenants, users, projects and tasks for demos and manual testing.
//!
//! # Invariants
//! - Seeding is idempotent: records are looked up by name before insert.
//! - All writes use explicitly pinned collections (`for_tenant`), never
//!   the ambient context.
//! - The whole seed runs in one transaction.

use crate::model::project::Project;
use crate::model::task::Task;
use crate::model::tenant::{Tenant, TenantId};
use crate::model::user::User;
use crate::repo::error::RepoResult;
use crate::repo::filter::Filter;
use crate::repo::scoped::ScopedCollection;
use crate::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use log::info;
use rusqlite::Connection;

pub const ACME_TENANT: &str = "Acme Corp";
pub const TECHSTART_TENANT: &str = "TechStart Inc";
pub const ACME_USER: &str = "tenant1user";
pub const TECHSTART_USER: &str = "tenant2user";
/// Seeded user without a tenant.
pub const ADMIN_USER: &str = "admin";

struct SeedProject {
    name: &'static str,
    tasks: &'static [(&'static str, bool)],
}

const ACME_PROJECTS: &[SeedProject] = &[
    SeedProject {
        name: "Website Redesign",
        tasks: &[("Create wireframes", true), ("Design homepage", false)],
    },
    SeedProject {
        name: "Mobile App Development",
        tasks: &[
            ("Setup development environment", true),
            ("Implement authentication", false),
        ],
    },
];

const TECHSTART_PROJECTS: &[SeedProject] = &[
    SeedProject {
        name: "API Integration",
        tasks: &[("Review API documentation", true), ("Implement webhooks", false)],
    },
    SeedProject {
        name: "Database Migration",
        tasks: &[
            ("Backup current database", true),
            ("Test migration scripts", false),
        ],
    },
];

/// Ids of the seeded tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleData {
    pub acme: TenantId,
    pub techstart: TenantId,
}

/// Creates the sample data set, reusing whatever already exists.
pub fn seed_sample_data(conn: &Connection) -> RepoResult<SampleData> {
    let tx = conn.unchecked_transaction()?;

    let acme = ensure_tenant(&tx, ACME_TENANT)?;
    let techstart = ensure_tenant(&tx, TECHSTART_TENANT)?;

    ensure_user(&tx, ACME_USER, Some(acme))?;
    ensure_user(&tx, TECHSTART_USER, Some(techstart))?;
    ensure_user(&tx, ADMIN_USER, None)?;

    let mut created = 0;
    created += ensure_projects(&tx, acme, ACME_PROJECTS)?;
    created += ensure_projects(&tx, techstart, TECHSTART_PROJECTS)?;

    tx.commit()?;
    info!("event=sample_data module=service status=ok records_created={created}");
    Ok(SampleData { acme, techstart })
}

fn ensure_tenant(conn: &Connection, name: &str) -> RepoResult<TenantId> {
    let tenants = SqliteTenantRepository::new(conn);
    if let Some(existing) = tenants.find_tenant_by_name(name)? {
        return Ok(existing.id);
    }
    tenants.create_tenant(&Tenant::new(name))
}

fn ensure_user(conn: &Connection, username: &str, tenant: Option<TenantId>) -> RepoResult<()> {
    let users = SqliteUserRepository::new(conn);
    if users.get_user_by_username(username)?.is_some() {
        return Ok(());
    }
    users.create_user(&User::new(username, tenant))
}

fn ensure_projects(
    conn: &Connection,
    tenant: TenantId,
    seeds: &[SeedProject],
) -> RepoResult<usize> {
    let projects = ScopedCollection::<Project>::new(conn).for_tenant(Some(&tenant));
    let tasks = ScopedCollection::<Task>::new(conn).for_tenant(Some(&tenant));
    let mut created = 0;

    for seed in seeds {
        let project = match projects
            .filter(Filter::new().eq("name", seed.name))
            .first()?
        {
            Some(existing) => existing,
            None => {
                created += 1;
                projects.create(Project::for_tenant(tenant, seed.name))?
            }
        };

        for (title, is_done) in seed.tasks {
            let exists = tasks
                .filter(
                    Filter::new()
                        .eq("project_id", project.id)
                        .eq("title", *title),
                )
                .exists()?;
            if exists {
                continue;
            }
            let mut task = Task::new(project.id, *title);
            task.is_done = *is_done;
            tasks.create(task)?;
            created += 1;
        }
    }

    Ok(created)
}
