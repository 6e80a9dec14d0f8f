use tenantbox_core::db::open_db_in_memory;
use tenantbox_core::service::sample_data::{
    ACME_TENANT, ACME_USER, ADMIN_USER, TECHSTART_TENANT, TECHSTART_USER,
};
use tenantbox_core::{
    find_cross_tenant_tasks, run_unit_of_work, seed_sample_data, Actor, Project, ProjectService,
    ScopedCollection, SqliteTenantRepository, SqliteUserRepository, Task, TenantRepository,
    UserRepository,
};

#[test]
fn seed_creates_two_isolated_tenants() {
    let conn = open_db_in_memory().unwrap();
    let sample = seed_sample_data(&conn).unwrap();

    let tenants = SqliteTenantRepository::new(&conn).list_tenants().unwrap();
    let names: Vec<&str> = tenants.iter().map(|tenant| tenant.name.as_str()).collect();
    assert_eq!(names, vec![ACME_TENANT, TECHSTART_TENANT]);

    let users = SqliteUserRepository::new(&conn);
    let acme_user = users.get_user_by_username(ACME_USER).unwrap().unwrap();
    let techstart_user = users.get_user_by_username(TECHSTART_USER).unwrap().unwrap();
    assert_eq!(acme_user.tenant, Some(sample.acme));
    assert_eq!(techstart_user.tenant, Some(sample.techstart));

    let acme_projects = run_unit_of_work(&Actor::authenticated(&acme_user), || {
        ProjectService::new(&conn).list_projects()
    })
    .unwrap();
    let acme_names: Vec<&str> = acme_projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(acme_names, vec!["Mobile App Development", "Website Redesign"]);

    let techstart_projects = run_unit_of_work(&Actor::authenticated(&techstart_user), || {
        ProjectService::new(&conn).list_projects()
    })
    .unwrap();
    let techstart_names: Vec<&str> = techstart_projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(techstart_names, vec!["API Integration", "Database Migration"]);

    assert!(find_cross_tenant_tasks(&conn).unwrap().is_empty());
}

#[test]
fn seeding_twice_creates_nothing_new() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_sample_data(&conn).unwrap();
    let second = seed_sample_data(&conn).unwrap();
    assert_eq!(first, second);

    let projects = ScopedCollection::<Project>::new(&conn).without_tenant_filter();
    let tasks = ScopedCollection::<Task>::new(&conn).without_tenant_filter();
    assert_eq!(projects.list_all().count().unwrap(), 4);
    assert_eq!(tasks.list_all().count().unwrap(), 8);
    assert_eq!(SqliteTenantRepository::new(&conn).list_tenants().unwrap().len(), 2);
}

#[test]
fn admin_user_has_no_tenant_context() {
    let conn = open_db_in_memory().unwrap();
    seed_sample_data(&conn).unwrap();

    let admin = SqliteUserRepository::new(&conn)
        .get_user_by_username(ADMIN_USER)
        .unwrap()
        .unwrap();
    assert_eq!(admin.tenant, None);

    let visible = run_unit_of_work(&Actor::authenticated(&admin), || {
        ProjectService::new(&conn).list_projects()
    })
    .unwrap();
    assert_eq!(visible.len(), 4);
}
