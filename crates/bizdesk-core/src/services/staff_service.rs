// ============================================================================
// BizDesk Core - Staff Service
// File: crates/bizdesk-core/src/services/staff_service.rs
// ============================================================================
//! Staff records and tenant roles.

use std::sync::Arc;

use bizdesk_security::PasswordService;
use bizdesk_shared::{Page, Pagination};
use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::context::TenantContext;
use crate::domain::rut;
use crate::domain::staff::ROLE_EMPLOYEE;
use crate::domain::{Role, Staff};
use crate::error::DomainError;
use crate::repositories::{RoleRepository, StaffFilter, StaffRepository};

#[derive(Debug, Clone, Default)]
pub struct NewStaff {
    pub email: String,
    pub full_name: String,
    /// Role name; defaults to `employee`.
    pub role: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub base_salary: i64,
    pub pto_balance_days: f32,
    /// Without a password the staff member cannot sign in.
    pub password: Option<String>,
}

/// Fields left `None` are kept.
#[derive(Debug, Clone, Default)]
pub struct StaffUpdate {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub base_salary: Option<i64>,
    pub pto_balance_days: Option<f32>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

pub struct StaffService {
    staff: Arc<dyn StaffRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl StaffService {
    pub fn new(staff: Arc<dyn StaffRepository>, roles: Arc<dyn RoleRepository>) -> Self {
        Self { staff, roles }
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: &StaffFilter,
        pagination: Pagination,
    ) -> Result<Page<Staff>, DomainError> {
        self.staff.list(&ctx.tenant_id, filter, pagination).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: &Uuid) -> Result<Staff, DomainError> {
        self.staff
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Staff"))
    }

    pub async fn create(&self, ctx: &TenantContext, input: NewStaff) -> Result<Staff, DomainError> {
        ctx.require_admin()?;

        let role_name = input.role.as_deref().unwrap_or(ROLE_EMPLOYEE);
        let role = self.role_by_name(ctx, role_name).await?;

        let mut staff = Staff::new(ctx.tenant_id, input.email, input.full_name, &role);
        if self.staff.find_by_email(&ctx.tenant_id, &staff.email).await?.is_some() {
            return Err(DomainError::Conflict(format!("e-mail '{}' is already in use", staff.email)));
        }

        staff.job_title = input.job_title;
        staff.phone = input.phone;
        staff.rut = rut::parse_optional(input.rut.as_deref())?.map(|r| r.to_string());
        staff.hire_date = input.hire_date;
        staff.base_salary = input.base_salary;
        staff.pto_balance_days = input.pto_balance_days;
        if let Some(password) = input.password.as_deref() {
            staff.password_hash = Some(
                PasswordService::hash(password).map_err(|e| DomainError::Validation(e.to_string()))?,
            );
        }
        staff.validate()?;

        let created = self.staff.create(&staff).await?;
        info!(tenant_id = %ctx.tenant_id, staff_id = %created.id, "Staff created");
        Ok(created)
    }

    pub async fn update(&self, ctx: &TenantContext, id: &Uuid, input: StaffUpdate) -> Result<Staff, DomainError> {
        ctx.require_admin()?;
        let mut staff = self.get(ctx, id).await?;

        if let Some(name) = input.full_name {
            staff.full_name = name.trim().to_string();
        }
        if let Some(role_name) = input.role.as_deref() {
            let role = self.role_by_name(ctx, role_name).await?;
            staff.role_id = role.id;
            staff.role_name = role.name;
        }
        if input.job_title.is_some() {
            staff.job_title = input.job_title;
        }
        if input.phone.is_some() {
            staff.phone = input.phone;
        }
        if let Some(r) = input.rut.as_deref() {
            staff.rut = rut::parse_optional(Some(r))?.map(|r| r.to_string());
        }
        if input.hire_date.is_some() {
            staff.hire_date = input.hire_date;
        }
        if let Some(salary) = input.base_salary {
            staff.base_salary = salary;
        }
        if let Some(balance) = input.pto_balance_days {
            staff.pto_balance_days = balance;
        }
        if let Some(active) = input.is_active {
            staff.is_active = active;
        }
        if let Some(password) = input.password.as_deref() {
            staff.password_hash = Some(
                PasswordService::hash(password).map_err(|e| DomainError::Validation(e.to_string()))?,
            );
        }
        staff.validate()?;
        staff.touch();

        self.staff.update(&staff).await
    }

    pub async fn delete(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        ctx.require_admin()?;
        if ctx.staff_id() == Some(*id) {
            return Err(DomainError::InvalidState("you cannot delete your own account".to_string()));
        }
        let mut staff = self.get(ctx, id).await?;
        staff.soft_delete();
        self.staff.update(&staff).await?;
        info!(tenant_id = %ctx.tenant_id, staff_id = %id, "Staff deleted");
        Ok(())
    }

    // ---------------------------------------------------------------- roles

    pub async fn list_roles(&self, ctx: &TenantContext) -> Result<Vec<Role>, DomainError> {
        self.roles.list(&ctx.tenant_id).await
    }

    pub async fn create_role(
        &self,
        ctx: &TenantContext,
        name: String,
        description: Option<String>,
        permissions: Vec<String>,
    ) -> Result<Role, DomainError> {
        ctx.require_admin()?;
        let role = Role::new(ctx.tenant_id, name, description, permissions)?;
        if self.roles.find_by_name(&ctx.tenant_id, &role.name).await?.is_some() {
            return Err(DomainError::Conflict(format!("role '{}' already exists", role.name)));
        }
        self.roles.create(&role).await
    }

    pub async fn delete_role(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        ctx.require_admin()?;
        let mut role = self
            .roles
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Role"))?;
        if role.is_built_in() {
            return Err(DomainError::InvalidState(format!("role '{}' is built in", role.name)));
        }
        let in_use = self.roles.count_staff_with_role(&ctx.tenant_id, id).await?;
        if in_use > 0 {
            warn!(role_id = %id, in_use, "Role delete refused: still assigned");
            return Err(DomainError::Conflict(format!(
                "role '{}' is assigned to {} staff member(s)",
                role.name, in_use
            )));
        }
        role.soft_delete();
        self.roles.update(&role).await?;
        Ok(())
    }

    async fn role_by_name(&self, ctx: &TenantContext, name: &str) -> Result<Role, DomainError> {
        self.roles
            .find_by_name(&ctx.tenant_id, &name.trim().to_lowercase())
            .await?
            .ok_or_else(|| DomainError::Validation(format!("unknown role '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockRoleRepository, MockStaffRepository};

    fn admin(tenant: Uuid) -> TenantContext {
        TenantContext::staff(tenant, Uuid::new_v4(), "admin")
    }

    #[tokio::test]
    async fn test_create_defaults_to_employee_role() {
        let tenant = Uuid::new_v4();
        let employee = Role::new(tenant, "employee".into(), None, vec![]).unwrap();

        let mut roles = MockRoleRepository::new();
        roles
            .expect_find_by_name()
            .withf(|_, name| name == "employee")
            .returning(move |_, _| Ok(Some(employee.clone())));
        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_email().returning(|_, _| Ok(None));
        staff.expect_create().returning(|s| Ok(s.clone()));

        let svc = StaffService::new(Arc::new(staff), Arc::new(roles));
        let created = svc
            .create(
                &admin(tenant),
                NewStaff {
                    email: "luis@pansur.cl".into(),
                    full_name: "Luis Pérez".into(),
                    rut: Some("12.345.678-5".into()),
                    base_salary: 650_000,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.role_name, "employee");
        assert_eq!(created.rut.as_deref(), Some("12345678-5"));
        assert!(created.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let svc = StaffService::new(Arc::new(MockStaffRepository::new()), Arc::new(MockRoleRepository::new()));
        let ctx = TenantContext::staff(Uuid::new_v4(), Uuid::new_v4(), "employee");
        let err = svc.create(&ctx, NewStaff::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_role_in_use_conflicts() {
        let tenant = Uuid::new_v4();
        let role = Role::new(tenant, "bodega".into(), None, vec![]).unwrap();
        let role_id = role.id;

        let mut roles = MockRoleRepository::new();
        roles.expect_find_by_id().returning(move |_, _| Ok(Some(role.clone())));
        roles.expect_count_staff_with_role().returning(|_, _| Ok(2));
        roles.expect_update().never();

        let svc = StaffService::new(Arc::new(MockStaffRepository::new()), Arc::new(roles));
        let err = svc.delete_role(&admin(tenant), &role_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_unused_role() {
        let tenant = Uuid::new_v4();
        let role = Role::new(tenant, "bodega".into(), None, vec![]).unwrap();
        let role_id = role.id;

        let mut roles = MockRoleRepository::new();
        roles.expect_find_by_id().returning(move |_, _| Ok(Some(role.clone())));
        roles.expect_count_staff_with_role().returning(|_, _| Ok(0));
        roles
            .expect_update()
            .withf(|r| r.is_deleted)
            .times(1)
            .returning(|r| Ok(r.clone()));

        let svc = StaffService::new(Arc::new(MockStaffRepository::new()), Arc::new(roles));
        svc.delete_role(&admin(tenant), &role_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_built_in_role_cannot_be_deleted() {
        let tenant = Uuid::new_v4();
        let role = Role::new(tenant, "manager".into(), None, vec![]).unwrap();
        let role_id = role.id;
        let mut roles = MockRoleRepository::new();
        roles.expect_find_by_id().returning(move |_, _| Ok(Some(role.clone())));

        let svc = StaffService::new(Arc::new(MockStaffRepository::new()), Arc::new(roles));
        let err = svc.delete_role(&admin(tenant), &role_id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }
}
