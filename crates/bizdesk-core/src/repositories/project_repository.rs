//! Project and task repository traits (ports)

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Project, Task, TaskStatus};
use crate::error::DomainError;

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn list(&self, tenant_id: &Uuid, pagination: Pagination) -> Result<Page<Project>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Project>, DomainError>;
    async fn create(&self, project: &Project) -> Result<Project, DomainError>;
    async fn update(&self, project: &Project) -> Result<Project, DomainError>;
    /// Non-deleted tasks of the project that are not done.
    async fn count_open_tasks(&self, tenant_id: &Uuid, project_id: &Uuid) -> Result<i64, DomainError>;
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &TaskFilter,
        pagination: Pagination,
    ) -> Result<Page<Task>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Task>, DomainError>;
    async fn create(&self, task: &Task) -> Result<Task, DomainError>;
    async fn update(&self, task: &Task) -> Result<Task, DomainError>;
}
