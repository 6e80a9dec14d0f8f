//! Project/task use-case service.
//!
//! # Responsibility
//! - Provide the project and task operations an application layer calls
//!   from inside a unit of work.
//! - Keep task tenants consistent with their project's tenant.
//!
//! # Invariants
//! - Every read and write goes through a context-following
//!   [`ScopedCollection`]; nothing here names a tenant explicitly except
//!   when copying a project's tenant onto its tasks.
//! - A project or task owned by another tenant is `NotFound`.

use crate::config::UnscopedPolicy;
use crate::model::project::{Project, ProjectId};
use crate::model::scoped::TenantScoped;
use crate::model::task::{Task, TaskId};
use crate::model::tenant::TenantId;
use crate::repo::error::RepoError;
use crate::repo::filter::Filter;
use crate::repo::scoped::ScopedCollection;
use log::warn;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for project/task use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Target project does not exist in the current scope.
    ProjectNotFound(ProjectId),
    /// Target task does not exist in the current scope.
    TaskNotFound(TaskId),
    /// A task was bound to a tenant other than its project's.
    CrossTenantReference {
        task_tenant: TenantId,
        project_tenant: TenantId,
    },
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::CrossTenantReference {
                task_tenant,
                project_tenant,
            } => write!(
                f,
                "task tenant {task_tenant} does not match project tenant {project_tenant}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Search hits for one query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
}

/// Task counters for one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: usize,
    pub done: usize,
}

/// Use-case service over projects and their tasks.
pub struct ProjectService<'conn> {
    projects: ScopedCollection<'conn, Project>,
    tasks: ScopedCollection<'conn, Task>,
}

impl<'conn> ProjectService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_policy(conn, UnscopedPolicy::default())
    }

    pub fn with_policy(conn: &'conn Connection, policy: UnscopedPolicy) -> Self {
        Self {
            projects: ScopedCollection::new(conn).with_policy(policy),
            tasks: ScopedCollection::new(conn).with_policy(policy),
        }
    }

    /// Projects visible in the current scope, ordered by name.
    pub fn list_projects(&self) -> ServiceResult<Vec<Project>> {
        Ok(self.projects.list_all().fetch()?)
    }

    pub fn get_project(&self, id: ProjectId) -> ServiceResult<Project> {
        self.projects
            .get(id)
            .map_err(|err| not_found_as(err, ServiceError::ProjectNotFound(id)))
    }

    /// Creates a project owned by the current tenant.
    pub fn create_project(&self, name: &str) -> ServiceResult<Project> {
        Ok(self.projects.create(Project::new(name.trim()))?)
    }

    pub fn rename_project(&self, id: ProjectId, name: &str) -> ServiceResult<Project> {
        let mut project = self.get_project(id)?;
        project.name = name.trim().to_string();
        self.projects.save(&project)?;
        Ok(project)
    }

    /// Deletes a project; its tasks go with it.
    pub fn delete_project(&self, id: ProjectId) -> ServiceResult<()> {
        let project = self.get_project(id)?;
        self.projects.delete_entity(&project)?;
        Ok(())
    }

    /// The project and its tasks, ordered by title.
    pub fn project_detail(&self, id: ProjectId) -> ServiceResult<(Project, Vec<Task>)> {
        let project = self.get_project(id)?;
        let tasks = self
            .tasks
            .filter(Filter::new().eq("project_id", project.id))
            .fetch()?;
        Ok((project, tasks))
    }

    pub fn task_counts(&self, project_id: ProjectId) -> ServiceResult<TaskCounts> {
        let project = self.get_project(project_id)?;
        let for_project = self.tasks.filter(Filter::new().eq("project_id", project.id));
        let total = for_project.count()?;
        let done = for_project.filter(Filter::new().eq("is_done", true)).count()?;
        Ok(TaskCounts { total, done })
    }

    /// Creates an open task under a project in the current scope.
    pub fn create_task(&self, project_id: ProjectId, title: &str) -> ServiceResult<Task> {
        self.add_task(Task::new(project_id, title.trim()))
    }

    /// Stores `task` under its project, inheriting the project's tenant.
    ///
    /// # Errors
    /// - `ProjectNotFound` when the project is not visible in scope.
    /// - `CrossTenantReference` when `task` already names another tenant.
    pub fn add_task(&self, mut task: Task) -> ServiceResult<Task> {
        let project = self.get_project(task.project_id)?;
        bind_to_project(&mut task, &project)?;
        Ok(self.tasks.create(task)?)
    }

    /// Creates several open tasks under one project in one transaction.
    pub fn add_tasks(&self, project_id: ProjectId, titles: &[&str]) -> ServiceResult<Vec<Task>> {
        let project = self.get_project(project_id)?;
        let mut tasks = Vec::with_capacity(titles.len());
        for title in titles {
            let mut task = Task::new(project.id, title.trim());
            bind_to_project(&mut task, &project)?;
            tasks.push(task);
        }
        Ok(self.tasks.bulk_create(tasks)?)
    }

    pub fn get_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.tasks
            .get(id)
            .map_err(|err| not_found_as(err, ServiceError::TaskNotFound(id)))
    }

    /// Flips a task's completion state and returns the stored result.
    pub fn toggle_task(&self, id: TaskId) -> ServiceResult<Task> {
        let mut task = self.get_task(id)?;
        task.toggle();
        self.tasks.save(&task)?;
        Ok(task)
    }

    pub fn delete_task(&self, id: TaskId) -> ServiceResult<()> {
        let task = self.get_task(id)?;
        self.tasks.delete_entity(&task)?;
        Ok(())
    }

    /// Case-insensitive substring search over project names and task
    /// titles. A blank query returns nothing.
    pub fn search(&self, query: &str) -> ServiceResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::default());
        }
        Ok(SearchResults {
            projects: self
                .projects
                .filter(Filter::new().contains("name", query))
                .fetch()?,
            tasks: self
                .tasks
                .filter(Filter::new().contains("title", query))
                .fetch()?,
        })
    }
}

fn bind_to_project(task: &mut Task, project: &Project) -> ServiceResult<()> {
    let Some(project_tenant) = project.tenant().copied() else {
        return Err(RepoError::InvalidData(format!("project {} has no tenant", project.id)).into());
    };
    match task.tenant {
        Some(task_tenant) if task_tenant != project_tenant => {
            warn!(
                "event=cross_tenant_reference module=service status=refused task_id={} task_tenant={} project_tenant={}",
                task.id, task_tenant, project_tenant
            );
            Err(ServiceError::CrossTenantReference {
                task_tenant,
                project_tenant,
            })
        }
        _ => {
            task.set_tenant(project_tenant);
            Ok(())
        }
    }
}

fn not_found_as(err: RepoError, replacement: ServiceError) -> ServiceError {
    match err {
        RepoError::NotFound => replacement,
        other => ServiceError::Repo(other),
    }
}
