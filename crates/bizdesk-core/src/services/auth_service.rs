// ============================================================================
// BizDesk Core - Authentication Service
// File: crates/bizdesk-core/src/services/auth_service.rs
// ============================================================================
//! Tenant sign-up, staff login and tenant resolution for incoming requests.

use std::sync::Arc;

use bizdesk_security::{JwtService, PasswordService};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::context::TenantContext;
use crate::domain::rut;
use crate::domain::staff::{BUILT_IN_ROLES, ROLE_ADMIN};
use crate::domain::{Role, Staff, Tenant};
use crate::error::DomainError;
use crate::repositories::{RoleRepository, StaffRepository, TenantRepository};

/// Input for creating a tenant together with its first admin.
#[derive(Debug, Clone)]
pub struct RegisterTenant {
    pub name: String,
    pub slug: String,
    pub rut: Option<String>,
    pub owner_email: String,
    pub owner_name: String,
    pub password: String,
}

/// Result of sign-up or login
#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
    pub tenant: Tenant,
    pub staff: Staff,
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

pub struct AuthService {
    tenants: Arc<dyn TenantRepository>,
    staff: Arc<dyn StaffRepository>,
    roles: Arc<dyn RoleRepository>,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        staff: Arc<dyn StaffRepository>,
        roles: Arc<dyn RoleRepository>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            tenants,
            staff,
            roles,
            jwt,
        }
    }

    /// Creates the tenant, its built-in roles and the owner account.
    pub async fn register_tenant(&self, input: RegisterTenant) -> Result<AuthResult, DomainError> {
        info!("Tenant registration for slug: {}", input.slug);

        let company_rut = rut::parse_optional(input.rut.as_deref())?;
        let tenant = Tenant::new(input.name, input.slug, company_rut.map(|r| r.to_string()))?;

        if self.tenants.find_by_slug(&tenant.slug).await?.is_some() {
            warn!("Registration refused: slug already taken: {}", tenant.slug);
            return Err(DomainError::Conflict(format!("slug '{}' is already taken", tenant.slug)));
        }

        let password_hash = PasswordService::hash(&input.password)
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        let tenant = self.tenants.create(&tenant).await?;

        let mut admin_role = None;
        for name in BUILT_IN_ROLES {
            let role = Role::new(tenant.id, name.to_string(), None, Vec::new())?;
            let role = self.roles.create(&role).await?;
            if role.name == ROLE_ADMIN {
                admin_role = Some(role);
            }
        }
        let admin_role = admin_role
            .ok_or_else(|| DomainError::InternalError("admin role was not created".to_string()))?;

        let mut owner = Staff::new(tenant.id, input.owner_email, input.owner_name, &admin_role);
        owner.password_hash = Some(password_hash);
        validator::Validate::validate(&owner)?;
        let owner = self.staff.create(&owner).await?;

        info!(tenant_id = %tenant.id, "Tenant registered: {}", tenant.slug);
        self.issue(tenant, owner)
    }

    pub async fn login(
        &self,
        tenant_slug: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, DomainError> {
        let tenant = self
            .tenants
            .find_by_slug(&tenant_slug.trim().to_lowercase())
            .await?
            .ok_or_else(|| {
                warn!("Login failed: unknown tenant: {}", tenant_slug);
                DomainError::InvalidCredentials
            })?;
        if !tenant.is_usable() {
            warn!("Login refused: tenant inactive: {}", tenant.slug);
            return Err(DomainError::TenantNotActive);
        }

        let staff = self
            .staff
            .find_by_email(&tenant.id, &email.trim().to_lowercase())
            .await?
            .ok_or_else(|| {
                warn!(
                    "Login failed: email not found: {}",
                    bizdesk_shared::utils::mask_email(email)
                );
                DomainError::InvalidCredentials
            })?;

        if !staff.can_login() {
            warn!(staff_id = %staff.id, "Login refused: account cannot sign in");
            return Err(DomainError::InvalidCredentials);
        }

        let stored_hash = staff.password_hash.as_deref().ok_or(DomainError::InvalidCredentials)?;
        let valid = PasswordService::verify(password, stored_hash).map_err(|e| {
            error!("Stored password hash unreadable: {}", e);
            DomainError::InvalidCredentials
        })?;
        if !valid {
            warn!(staff_id = %staff.id, "Login failed: wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        info!(tenant_id = %tenant.id, staff_id = %staff.id, "Login successful");
        self.issue(tenant, staff)
    }

    /// Loads the tenant a request claims and checks it may be used.
    pub async fn resolve_tenant(&self, tenant_id: &Uuid) -> Result<Tenant, DomainError> {
        let tenant = self
            .tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tenant"))?;
        if !tenant.is_usable() {
            return Err(DomainError::TenantNotActive);
        }
        Ok(tenant)
    }

    pub async fn current_tenant(&self, ctx: &TenantContext) -> Result<Tenant, DomainError> {
        self.resolve_tenant(&ctx.tenant_id).await
    }

    fn issue(&self, tenant: Tenant, staff: Staff) -> Result<AuthResult, DomainError> {
        let access_token = self
            .jwt
            .generate_access_token(staff.id, tenant.id, &staff.role_name)
            .map_err(|e| DomainError::InternalError(e.to_string()))?;
        Ok(AuthResult {
            tenant,
            staff,
            access_token,
            token_type: "Bearer",
            expires_in: self.jwt.access_token_expiry(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockRoleRepository, MockStaffRepository, MockTenantRepository};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(SECRET, 600))
    }

    fn input() -> RegisterTenant {
        RegisterTenant {
            name: "Panadería Sur".into(),
            slug: "panaderia-sur".into(),
            rut: Some("76.086.428-5".into()),
            owner_email: "Ana@PanSur.cl".into(),
            owner_name: "Ana Rojas".into(),
            password: "correct horse battery".into(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_roles_and_owner() {
        let mut tenants = MockTenantRepository::new();
        tenants.expect_find_by_slug().returning(|_| Ok(None));
        tenants.expect_create().returning(|t| Ok(t.clone()));

        let mut roles = MockRoleRepository::new();
        roles.expect_create().times(3).returning(|r| Ok(r.clone()));

        let mut staff = MockStaffRepository::new();
        staff
            .expect_create()
            .withf(|s| s.role_name == "admin" && s.email == "ana@pansur.cl" && s.password_hash.is_some())
            .returning(|s| Ok(s.clone()));

        let svc = AuthService::new(Arc::new(tenants), Arc::new(staff), Arc::new(roles), jwt());
        let result = svc.register_tenant(input()).await.unwrap();

        assert_eq!(result.tenant.rut.as_deref(), Some("76086428-5"));
        let claims = jwt().validate_token(&result.access_token).unwrap();
        assert_eq!(claims.tenant_id, result.tenant.id);
        assert_eq!(claims.role, "admin");
    }

    #[tokio::test]
    async fn test_register_rejects_taken_slug() {
        let mut tenants = MockTenantRepository::new();
        tenants
            .expect_find_by_slug()
            .returning(|_| Ok(Some(Tenant::new("Otra".into(), "panaderia-sur".into(), None).unwrap())));

        let svc = AuthService::new(
            Arc::new(tenants),
            Arc::new(MockStaffRepository::new()),
            Arc::new(MockRoleRepository::new()),
            jwt(),
        );
        let err = svc.register_tenant(input()).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let tenant = Tenant::new("Panadería Sur".into(), "panaderia-sur".into(), None).unwrap();
        let tenant_id = tenant.id;
        let role = Role::new(tenant_id, "admin".into(), None, vec![]).unwrap();
        let mut account = Staff::new(tenant_id, "ana@pansur.cl".into(), "Ana Rojas".into(), &role);
        account.password_hash = Some(PasswordService::hash("correct horse battery").unwrap());

        let mut tenants = MockTenantRepository::new();
        tenants.expect_find_by_slug().returning(move |_| Ok(Some(tenant.clone())));
        let mut staff = MockStaffRepository::new();
        staff
            .expect_find_by_email()
            .returning(move |_, _| Ok(Some(account.clone())));

        let svc = AuthService::new(Arc::new(tenants), Arc::new(staff), Arc::new(MockRoleRepository::new()), jwt());

        let err = svc.login("panaderia-sur", "ana@pansur.cl", "nope nope nope").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));

        let ok = svc.login("Panaderia-Sur", "ANA@pansur.cl", "correct horse battery").await.unwrap();
        assert_eq!(ok.tenant.id, tenant_id);
    }

    #[tokio::test]
    async fn test_resolve_inactive_tenant() {
        let mut tenant = Tenant::new("Cerrada".into(), "cerrada".into(), None).unwrap();
        tenant.is_active = false;
        let id = tenant.id;
        let mut tenants = MockTenantRepository::new();
        tenants.expect_find_by_id().returning(move |_| Ok(Some(tenant.clone())));

        let svc = AuthService::new(
            Arc::new(tenants),
            Arc::new(MockStaffRepository::new()),
            Arc::new(MockRoleRepository::new()),
            jwt(),
        );
        assert!(matches!(svc.resolve_tenant(&id).await, Err(DomainError::TenantNotActive)));
    }
}
