// ============================================================================
// BizDesk Core - Project Service
// File: crates/bizdesk-core/src/services/project_service.rs
// ============================================================================
//! Projects and their tasks.

use std::sync::Arc;

use bizdesk_shared::{Page, Pagination};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::context::TenantContext;
use crate::domain::notification::EVENT_TASK_ASSIGNED;
use crate::domain::{Project, ProjectStatus, Task, TaskPriority, TaskStatus};
use crate::error::DomainError;
use crate::gateways::{DomainEvent, EventPublisher};
use crate::repositories::{ProjectRepository, StaffRepository, TaskFilter, TaskRepository};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInput {
    pub project_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
}

pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    tasks: Arc<dyn TaskRepository>,
    staff: Arc<dyn StaffRepository>,
    events: Arc<dyn EventPublisher>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        tasks: Arc<dyn TaskRepository>,
        staff: Arc<dyn StaffRepository>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            projects,
            tasks,
            staff,
            events,
        }
    }

    pub async fn list_projects(&self, ctx: &TenantContext, pagination: Pagination) -> Result<Page<Project>, DomainError> {
        self.projects.list(&ctx.tenant_id, pagination).await
    }

    pub async fn get_project(&self, ctx: &TenantContext, id: &Uuid) -> Result<Project, DomainError> {
        self.projects
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project"))
    }

    pub async fn create_project(&self, ctx: &TenantContext, input: ProjectInput) -> Result<Project, DomainError> {
        let name = input
            .name
            .ok_or_else(|| DomainError::Validation("name is required".to_string()))?;
        let mut project = Project::new(ctx.tenant_id, name);
        project.description = input.description;
        project.status = input.status.unwrap_or_default();
        project.due_date = input.due_date;
        project.validate()?;
        self.projects.create(&project).await
    }

    pub async fn update_project(&self, ctx: &TenantContext, id: &Uuid, input: ProjectInput) -> Result<Project, DomainError> {
        let mut project = self.get_project(ctx, id).await?;
        if let Some(name) = input.name {
            project.name = name.trim().to_string();
        }
        if input.description.is_some() {
            project.description = input.description;
        }
        if let Some(status) = input.status {
            project.status = status;
        }
        if input.due_date.is_some() {
            project.due_date = input.due_date;
        }
        project.validate()?;
        project.updated_at = chrono::Utc::now();
        self.projects.update(&project).await
    }

    pub async fn delete_project(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        let mut project = self.get_project(ctx, id).await?;
        let open = self.projects.count_open_tasks(&ctx.tenant_id, id).await?;
        if open > 0 {
            warn!(project_id = %id, open, "Project delete refused: open tasks");
            return Err(DomainError::Conflict(format!("project still has {} open task(s)", open)));
        }
        project.soft_delete();
        self.projects.update(&project).await?;
        info!(tenant_id = %ctx.tenant_id, project_id = %id, "Project deleted");
        Ok(())
    }

    // ---------------------------------------------------------------- tasks

    pub async fn list_tasks(
        &self,
        ctx: &TenantContext,
        filter: &TaskFilter,
        pagination: Pagination,
    ) -> Result<Page<Task>, DomainError> {
        self.tasks.list(&ctx.tenant_id, filter, pagination).await
    }

    pub async fn get_task(&self, ctx: &TenantContext, id: &Uuid) -> Result<Task, DomainError> {
        self.tasks
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Task"))
    }

    pub async fn create_task(&self, ctx: &TenantContext, input: TaskInput) -> Result<Task, DomainError> {
        let title = input
            .title
            .clone()
            .ok_or_else(|| DomainError::Validation("title is required".to_string()))?;
        let mut task = Task::new(ctx.tenant_id, title);
        if let Some(project_id) = input.project_id {
            self.get_project(ctx, &project_id).await?;
            task.project_id = Some(project_id);
        }
        task.description = input.description;
        task.priority = input.priority.unwrap_or_default();
        task.due_date = input.due_date;
        if let Some(status) = input.status {
            task.set_status(status);
        }
        let assigned = self.assign(ctx, &mut task, input.assignee_id).await?;
        task.validate()?;

        let created = self.tasks.create(&task).await?;
        if assigned {
            self.announce_assignment(ctx, &created).await;
        }
        Ok(created)
    }

    pub async fn update_task(&self, ctx: &TenantContext, id: &Uuid, input: TaskInput) -> Result<Task, DomainError> {
        let mut task = self.get_task(ctx, id).await?;
        if let Some(project_id) = input.project_id {
            self.get_project(ctx, &project_id).await?;
            task.project_id = Some(project_id);
        }
        if let Some(title) = input.title {
            task.title = title.trim().to_string();
        }
        if input.description.is_some() {
            task.description = input.description;
        }
        if let Some(priority) = input.priority {
            task.priority = priority;
        }
        if input.due_date.is_some() {
            task.due_date = input.due_date;
        }
        if let Some(status) = input.status {
            task.set_status(status);
        }
        let assigned = match input.assignee_id {
            Some(assignee) => self.assign(ctx, &mut task, Some(assignee)).await?,
            None => false,
        };
        task.validate()?;
        task.updated_at = chrono::Utc::now();

        let saved = self.tasks.update(&task).await?;
        if assigned {
            self.announce_assignment(ctx, &saved).await;
        }
        Ok(saved)
    }

    pub async fn set_task_status(&self, ctx: &TenantContext, id: &Uuid, status: TaskStatus) -> Result<Task, DomainError> {
        let mut task = self.get_task(ctx, id).await?;
        task.set_status(status);
        self.tasks.update(&task).await
    }

    pub async fn delete_task(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        let mut task = self.get_task(ctx, id).await?;
        task.soft_delete();
        self.tasks.update(&task).await?;
        Ok(())
    }

    /// Validates the assignee belongs to the tenant and reports whether the
    /// task changed hands.
    async fn assign(&self, ctx: &TenantContext, task: &mut Task, assignee: Option<Uuid>) -> Result<bool, DomainError> {
        if let Some(staff_id) = assignee {
            let staff = self
                .staff
                .find_by_id(&ctx.tenant_id, &staff_id)
                .await?
                .ok_or_else(|| DomainError::Validation(format!("unknown assignee {}", staff_id)))?;
            if !staff.is_active {
                return Err(DomainError::Validation("assignee is not active".to_string()));
            }
        }
        Ok(task.assign(assignee))
    }

    async fn announce_assignment(&self, ctx: &TenantContext, task: &Task) {
        self.events
            .publish(DomainEvent::new(
                ctx.tenant_id,
                EVENT_TASK_ASSIGNED,
                task.assignee_id,
                json!({
                    "task_id": task.id,
                    "title": task.title,
                    "priority": task.priority.as_str(),
                    "due_date": task.due_date,
                }),
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, Staff};
    use crate::gateways::MockEventPublisher;
    use crate::repositories::{MockProjectRepository, MockStaffRepository, MockTaskRepository};

    fn ctx(tenant: Uuid) -> TenantContext {
        TenantContext::staff(tenant, Uuid::new_v4(), "manager")
    }

    fn staff_member(tenant: Uuid) -> Staff {
        let role = Role::new(tenant, "employee".into(), None, vec![]).unwrap();
        Staff::new(tenant, "luis@pansur.cl".into(), "Luis Pérez".into(), &role)
    }

    #[tokio::test]
    async fn test_delete_project_with_open_tasks_conflicts() {
        let tenant = Uuid::new_v4();
        let project = Project::new(tenant, "Temporada".into());
        let id = project.id;

        let mut projects = MockProjectRepository::new();
        projects.expect_find_by_id().returning(move |_, _| Ok(Some(project.clone())));
        projects.expect_count_open_tasks().returning(|_, _| Ok(3));
        projects.expect_update().never();

        let svc = ProjectService::new(
            Arc::new(projects),
            Arc::new(MockTaskRepository::new()),
            Arc::new(MockStaffRepository::new()),
            Arc::new(MockEventPublisher::new()),
        );
        let err = svc.delete_project(&ctx(tenant), &id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_task_with_assignee_publishes() {
        let tenant = Uuid::new_v4();
        let member = staff_member(tenant);
        let member_id = member.id;

        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(move |_, _| Ok(Some(member.clone())));
        let mut tasks = MockTaskRepository::new();
        tasks.expect_create().returning(|t| Ok(t.clone()));
        let mut events = MockEventPublisher::new();
        events
            .expect_publish()
            .withf(move |e| e.event_type == "task.assigned" && e.subject_staff_id == Some(member_id))
            .times(1)
            .returning(|_| ());

        let svc = ProjectService::new(
            Arc::new(MockProjectRepository::new()),
            Arc::new(tasks),
            Arc::new(staff),
            Arc::new(events),
        );
        let task = svc
            .create_task(
                &ctx(tenant),
                TaskInput {
                    title: Some("Inventario".into()),
                    assignee_id: Some(member_id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(task.assignee_id, Some(member_id));
    }

    #[tokio::test]
    async fn test_same_assignee_does_not_republish() {
        let tenant = Uuid::new_v4();
        let member = staff_member(tenant);
        let member_id = member.id;
        let mut task = Task::new(tenant, "Inventario".into());
        task.assign(Some(member_id));
        let task_id = task.id;

        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(move |_, _| Ok(Some(member.clone())));
        let mut tasks = MockTaskRepository::new();
        tasks.expect_find_by_id().returning(move |_, _| Ok(Some(task.clone())));
        tasks.expect_update().returning(|t| Ok(t.clone()));
        let mut events = MockEventPublisher::new();
        events.expect_publish().never();

        let svc = ProjectService::new(
            Arc::new(MockProjectRepository::new()),
            Arc::new(tasks),
            Arc::new(staff),
            Arc::new(events),
        );
        svc.update_task(
            &ctx(tenant),
            &task_id,
            TaskInput {
                assignee_id: Some(member_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_assignee_rejected() {
        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(|_, _| Ok(None));
        let svc = ProjectService::new(
            Arc::new(MockProjectRepository::new()),
            Arc::new(MockTaskRepository::new()),
            Arc::new(staff),
            Arc::new(MockEventPublisher::new()),
        );
        let err = svc
            .create_task(
                &ctx(Uuid::new_v4()),
                TaskInput {
                    title: Some("x".into()),
                    assignee_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_status_done_stamps_completion() {
        let tenant = Uuid::new_v4();
        let task = Task::new(tenant, "Cerrar caja".into());
        let id = task.id;
        let mut tasks = MockTaskRepository::new();
        tasks.expect_find_by_id().returning(move |_, _| Ok(Some(task.clone())));
        tasks.expect_update().returning(|t| Ok(t.clone()));

        let svc = ProjectService::new(
            Arc::new(MockProjectRepository::new()),
            Arc::new(tasks),
            Arc::new(MockStaffRepository::new()),
            Arc::new(MockEventPublisher::new()),
        );
        let done = svc.set_task_status(&ctx(tenant), &id, TaskStatus::Done).await.unwrap();
        assert!(done.completed_at.is_some());
    }
}
