// ============================================================================
// BizDesk Core - Staff & Role Entities
// File: crates/bizdesk-core/src/domain/staff.rs
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_EMPLOYEE: &str = "employee";

/// Roles every tenant starts with.
pub const BUILT_IN_ROLES: [&str; 3] = [ROLE_ADMIN, ROLE_MANAGER, ROLE_EMPLOYEE];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Role {
    pub id: Uuid,
    pub tenant_id: Uuid,

    #[validate(length(min = 2, max = 50, message = "Role name must be between 2 and 50 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description too long"))]
    pub description: Option<String>,

    pub permissions: Vec<String>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Role {
    pub fn new(
        tenant_id: Uuid,
        name: String,
        description: Option<String>,
        permissions: Vec<String>,
    ) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let role = Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.trim().to_lowercase(),
            description,
            permissions,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        };
        role.validate()?;
        Ok(role)
    }

    pub fn is_built_in(&self) -> bool {
        BUILT_IN_ROLES.contains(&self.name.as_str())
    }

    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

/// A person working for the tenant. Staff are also the users that sign in.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Staff {
    pub id: Uuid,
    pub tenant_id: Uuid,

    #[validate(email(message = "Invalid email"))]
    pub email: String,

    #[validate(length(min = 2, max = 150, message = "Full name must be between 2 and 150 characters"))]
    pub full_name: String,

    pub role_id: Uuid,
    /// Joined from the role row; not stored on the staff row.
    pub role_name: String,

    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub hire_date: Option<NaiveDate>,

    /// Monthly gross salary in CLP.
    #[validate(range(min = 0, message = "Base salary cannot be negative"))]
    pub base_salary: i64,

    pub pto_balance_days: f32,
    pub is_active: bool,

    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Staff {
    pub fn new(tenant_id: Uuid, email: String, full_name: String, role: &Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            email: email.trim().to_lowercase(),
            full_name: full_name.trim().to_string(),
            role_id: role.id,
            role_name: role.name.clone(),
            job_title: None,
            phone: None,
            rut: None,
            hire_date: None,
            base_salary: 0,
            pto_balance_days: 0.0,
            is_active: true,
            password_hash: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn can_login(&self) -> bool {
        self.is_active && !self.is_deleted && self.password_hash.is_some()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.is_active = false;
        self.updated_at = now;
    }
}
