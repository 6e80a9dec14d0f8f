use rusqlite::{params, Connection};
use tenantbox_core::db::open_db_in_memory;
use tenantbox_core::{
    clear_current_tenant, find_cross_tenant_tasks, run_unit_of_work, set_current_tenant, Actor,
    ProjectService, ServiceError, SqliteTenantRepository, Task, TaskCounts, Tenant, TenantId,
    TenantRepository, UnscopedPolicy, User,
};

fn setup() -> (Connection, TenantId, TenantId) {
    clear_current_tenant();
    let conn = open_db_in_memory().unwrap();
    let tenants = SqliteTenantRepository::new(&conn);
    let acme = tenants.create_tenant(&Tenant::new("Acme")).unwrap();
    let globex = tenants.create_tenant(&Tenant::new("Globex")).unwrap();
    (conn, acme, globex)
}

fn actor(tenant: TenantId) -> Actor {
    Actor::authenticated(&User::new("member", Some(tenant)))
}

#[test]
fn created_projects_belong_to_the_acting_tenant() {
    let (conn, acme, globex) = setup();

    let project = run_unit_of_work(&actor(acme), || {
        ProjectService::new(&conn).create_project("  Launch  ")
    })
    .unwrap();
    assert_eq!(project.name, "Launch");
    assert_eq!(project.tenant, Some(acme));

    let seen_by_globex =
        run_unit_of_work(&actor(globex), || ProjectService::new(&conn).list_projects()).unwrap();
    assert!(seen_by_globex.is_empty());
}

#[test]
fn foreign_project_is_reported_as_project_not_found() {
    let (conn, acme, globex) = setup();
    let project = run_unit_of_work(&actor(acme), || {
        ProjectService::new(&conn).create_project("Secret")
    })
    .unwrap();

    set_current_tenant(globex);
    let service = ProjectService::new(&conn);
    match service.get_project(project.id) {
        Err(ServiceError::ProjectNotFound(id)) => assert_eq!(id, project.id),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        service.rename_project(project.id, "Mine now"),
        Err(ServiceError::ProjectNotFound(_))
    ));
    assert!(matches!(
        service.delete_project(project.id),
        Err(ServiceError::ProjectNotFound(_))
    ));
    assert!(matches!(
        service.create_task(project.id, "sneaky"),
        Err(ServiceError::ProjectNotFound(_))
    ));
    clear_current_tenant();
}

#[test]
fn tasks_inherit_project_tenant_and_toggle() {
    let (conn, acme, _) = setup();
    set_current_tenant(acme);
    let service = ProjectService::new(&conn);

    let project = service.create_project("Website").unwrap();
    let task = service.create_task(project.id, "Design homepage").unwrap();
    assert_eq!(task.tenant, Some(acme));
    assert!(!task.is_done);

    let toggled = service.toggle_task(task.id).unwrap();
    assert!(toggled.is_done);
    assert!(service.get_task(task.id).unwrap().is_done);

    let toggled_back = service.toggle_task(task.id).unwrap();
    assert!(!toggled_back.is_done);
    clear_current_tenant();
}

#[test]
fn add_tasks_creates_all_titles_in_one_call() {
    let (conn, acme, _) = setup();
    set_current_tenant(acme);
    let service = ProjectService::new(&conn);

    let project = service.create_project("Migration").unwrap();
    let created = service
        .add_tasks(project.id, &["Backup", "Migrate", "Verify"])
        .unwrap();
    assert_eq!(created.len(), 3);
    assert!(created.iter().all(|task| task.tenant == Some(acme)));

    let (_, tasks) = service.project_detail(project.id).unwrap();
    let titles: Vec<&str> = tasks.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["Backup", "Migrate", "Verify"]);
    clear_current_tenant();
}

#[test]
fn task_counts_track_completion() {
    let (conn, acme, _) = setup();
    set_current_tenant(acme);
    let service = ProjectService::new(&conn);

    let project = service.create_project("Counts").unwrap();
    let tasks = service.add_tasks(project.id, &["a", "b", "c"]).unwrap();
    service.toggle_task(tasks[0].id).unwrap();

    assert_eq!(
        service.task_counts(project.id).unwrap(),
        TaskCounts { total: 3, done: 1 }
    );
    clear_current_tenant();
}

#[test]
fn add_task_refuses_task_bound_to_another_tenant() {
    let (conn, acme, globex) = setup();
    set_current_tenant(acme);
    let service = ProjectService::new(&conn);
    let project = service.create_project("Website").unwrap();

    let mut task = Task::new(project.id, "misplaced");
    task.tenant = Some(globex);
    match service.add_task(task) {
        Err(ServiceError::CrossTenantReference {
            task_tenant,
            project_tenant,
        }) => {
            assert_eq!(task_tenant, globex);
            assert_eq!(project_tenant, acme);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(service.task_counts(project.id).unwrap().total, 0);
    clear_current_tenant();
}

#[test]
fn search_is_scoped_and_case_insensitive() {
    let (conn, acme, globex) = setup();

    run_unit_of_work(&actor(acme), || {
        let service = ProjectService::new(&conn);
        let project = service.create_project("API Gateway").unwrap();
        service.create_task(project.id, "Document the api").unwrap();
        service.create_task(project.id, "Load test").unwrap();
    });
    run_unit_of_work(&actor(globex), || {
        let service = ProjectService::new(&conn);
        service.create_project("Public API").unwrap();
    });

    let results = run_unit_of_work(&actor(acme), || ProjectService::new(&conn).search("api"))
        .unwrap();
    assert_eq!(results.projects.len(), 1);
    assert_eq!(results.projects[0].name, "API Gateway");
    assert_eq!(results.tasks.len(), 1);
    assert_eq!(results.tasks[0].title, "Document the api");

    let blank = run_unit_of_work(&actor(acme), || ProjectService::new(&conn).search("   "))
        .unwrap();
    assert!(blank.projects.is_empty());
    assert!(blank.tasks.is_empty());
}

#[test]
fn deleting_a_project_removes_its_tasks() {
    let (conn, acme, _) = setup();
    set_current_tenant(acme);
    let service = ProjectService::new(&conn);

    let project = service.create_project("Temporary").unwrap();
    let task = service.create_task(project.id, "gone soon").unwrap();
    service.delete_project(project.id).unwrap();

    assert!(matches!(
        service.get_task(task.id),
        Err(ServiceError::TaskNotFound(_))
    ));
    clear_current_tenant();
}

#[test]
fn deny_all_service_sees_nothing_outside_a_unit_of_work() {
    let (conn, acme, _) = setup();
    run_unit_of_work(&actor(acme), || {
        ProjectService::new(&conn).create_project("Hidden").unwrap();
    });

    let strict = ProjectService::with_policy(&conn, UnscopedPolicy::DenyAll);
    assert!(strict.list_projects().unwrap().is_empty());
    assert_eq!(ProjectService::new(&conn).list_projects().unwrap().len(), 1);
}

#[test]
fn consistency_audit_reports_cross_tenant_tasks() {
    let (conn, acme, globex) = setup();
    let project = run_unit_of_work(&actor(acme), || {
        let service = ProjectService::new(&conn);
        let project = service.create_project("Audited").unwrap();
        service.create_task(project.id, "fine").unwrap();
        project
    });
    assert!(find_cross_tenant_tasks(&conn).unwrap().is_empty());

    let bad_task = uuid::Uuid::new_v4();
    conn.execute(
        "INSERT INTO tasks (id, tenant_id, project_id, title, is_done) VALUES (?1, ?2, ?3, 'bad', 0);",
        params![bad_task.to_string(), globex.to_string(), project.id.to_string()],
    )
    .unwrap();

    let mismatches = find_cross_tenant_tasks(&conn).unwrap();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].task_id, bad_task);
    assert_eq!(mismatches[0].task_tenant, globex);
    assert_eq!(mismatches[0].project_id, project.id);
    assert_eq!(mismatches[0].project_tenant, acme);
}

#[test]
fn foreign_tasks_are_invisible_and_cannot_be_toggled() {
    let (conn, acme, globex) = setup();
    let task = run_unit_of_work(&actor(acme), || {
        let service = ProjectService::new(&conn);
        let project = service.create_project("P1").unwrap();
        service.create_task(project.id, "internal").unwrap()
    });

    run_unit_of_work(&actor(globex), || {
        let service = ProjectService::new(&conn);
        assert!(matches!(
            service.get_task(task.id),
            Err(ServiceError::TaskNotFound(_))
        ));
        assert!(matches!(
            service.toggle_task(task.id),
            Err(ServiceError::TaskNotFound(_))
        ));
        assert!(matches!(
            service.delete_task(task.id),
            Err(ServiceError::TaskNotFound(_))
        ));
        assert!(service.search("internal").unwrap().tasks.is_empty());
    });

    let still_open = run_unit_of_work(&actor(acme), || ProjectService::new(&conn).get_task(task.id))
        .unwrap();
    assert!(!still_open.is_done);
}
