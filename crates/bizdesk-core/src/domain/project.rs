// ============================================================================
// BizDesk Core - Project & Task Entities
// File: crates/bizdesk-core/src/domain/project.rs
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    OnHold,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProjectStatus::Active),
            "on_hold" => Some(ProjectStatus::OnHold),
            "completed" => Some(ProjectStatus::Completed),
            "archived" => Some(ProjectStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "blocked" => Some(TaskStatus::Blocked),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, TaskStatus::Done)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "urgent" => Some(TaskPriority::Urgent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Project {
    pub id: Uuid,
    pub tenant_id: Uuid,

    #[validate(length(min = 2, max = 150, message = "Project name must be between 2 and 150 characters"))]
    pub name: String,

    pub description: Option<String>,
    pub status: ProjectStatus,
    pub due_date: Option<NaiveDate>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(tenant_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.trim().to_string(),
            description: None,
            status: ProjectStatus::Active,
            due_date: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Task {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub project_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200, message = "Task title must be between 1 and 200 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(tenant_id: Uuid, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            project_id: None,
            title: title.trim().to_string(),
            description: None,
            assignee_id: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Moving to done stamps `completed_at`; leaving done clears it.
    pub fn set_status(&mut self, status: TaskStatus) {
        let now = Utc::now();
        match (self.status, status) {
            (TaskStatus::Done, TaskStatus::Done) => {}
            (_, TaskStatus::Done) => self.completed_at = Some(now),
            _ => self.completed_at = None,
        }
        self.status = status;
        self.updated_at = now;
    }

    /// Returns true when the assignee actually changed to someone.
    pub fn assign(&mut self, assignee: Option<Uuid>) -> bool {
        let changed = assignee.is_some() && assignee != self.assignee_id;
        self.assignee_id = assignee;
        self.updated_at = Utc::now();
        changed
    }

    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}
