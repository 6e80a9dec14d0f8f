//! CLI entry point.
//!
//! # Responsibility
//! - Seed the sample tenants into a database file.
//! - Walk through tenant isolation from the point of view of each seeded
//!   user, printing what every unit of work can see.
//!
//! Usage: `tenantbox [DB_PATH]` (defaults to `TENANTBOX_DB` or
//! `tenantbox.db`).

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use log::info;
use tenantbox_core::service::sample_data::{ACME_USER, ADMIN_USER, TECHSTART_USER};
use tenantbox_core::{
    find_cross_tenant_tasks, init_logging_from_config, open_db, run_unit_of_work, seed_sample_data,
    Actor, Changes, CoreConfig, Project, ProjectService, RepoError, ScopedCollection,
    SqliteTenantRepository, SqliteUserRepository, TenantRepository, UserRepository,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tenantbox: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut config = CoreConfig::from_env()?;
    if let Some(path) = std::env::args().nth(1) {
        config.db_path = PathBuf::from(path);
    }
    init_logging_from_config(&config)?;

    println!("tenantbox_core version={}", tenantbox_core::core_version());
    println!("database={}", config.db_path.display());

    let conn = open_db(&config.db_path)?;
    let sample = seed_sample_data(&conn)?;
    info!("event=cli_seed module=cli status=ok");

    let tenants = SqliteTenantRepository::new(&conn);
    let users = SqliteUserRepository::new(&conn);
    println!("\ntenants:");
    for tenant in tenants.list_tenants()? {
        println!("  {} ({})", tenant.name, tenant.id);
    }

    for username in [ACME_USER, TECHSTART_USER, ADMIN_USER] {
        let Some(user) = users.get_user_by_username(username)? else {
            continue;
        };
        let actor = Actor::authenticated(&user);
        let visible = run_unit_of_work(&actor, || {
            ProjectService::with_policy(&conn, config.unscoped_policy).list_projects()
        })?;
        println!("\n{username} sees {} project(s):", visible.len());
        for project in &visible {
            println!("  - {}", project.name);
        }
    }

    let acme_user = users
        .get_user_by_username(ACME_USER)?
        .ok_or("seeded user is missing")?;
    let acme_actor = Actor::authenticated(&acme_user);

    run_unit_of_work(&acme_actor, || -> Result<(), RepoError> {
        let projects = ScopedCollection::<Project>::new(&conn);

        let everything = projects.without_tenant_filter().list_all().count()?;
        let techstart = projects
            .for_tenant(Some(&sample.techstart))
            .list_all()
            .fetch()?;
        println!("\nfrom {ACME_USER}'s unit of work:");
        println!("  without_tenant_filter: {everything} project(s)");
        println!("  for_tenant(TechStart): {} project(s)", techstart.len());

        if let Some(foreign) = techstart.first() {
            match projects.get(foreign.id) {
                Err(RepoError::NotFound) => {
                    println!("  get(<TechStart project>) -> not found (isolated)")
                }
                Ok(_) => println!("  get(<TechStart project>) -> VISIBLE (isolation broken)"),
                Err(err) => return Err(err),
            }
        }

        match projects
            .list_all()
            .update(&Changes::new().set("tenant_id", sample.techstart))
        {
            Err(RepoError::ForbiddenMutation(message)) => {
                println!("  update(tenant_id=TechStart) -> refused: {message}")
            }
            Ok(count) => println!("  update(tenant_id=TechStart) -> {count} row(s) (unexpected)"),
            Err(err) => return Err(err),
        }
        Ok(())
    })?;

    let mismatches = find_cross_tenant_tasks(&conn)?;
    println!("\ncross-tenant task references: {}", mismatches.len());
    Ok(())
}
