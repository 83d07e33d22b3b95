//! Who is acting, and for which tenant.

use uuid::Uuid;

use crate::domain::staff::{ROLE_ADMIN, ROLE_MANAGER};
use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// A signed-in staff member.
    Staff { staff_id: Uuid, role: String },
    /// A trusted internal caller authenticated with the service API key.
    Service,
}

/// Resolved once per request and passed to every service call. All
/// repository access is scoped by `tenant_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub actor: Actor,
}

impl TenantContext {
    pub fn staff(tenant_id: Uuid, staff_id: Uuid, role: impl Into<String>) -> Self {
        Self {
            tenant_id,
            actor: Actor::Staff {
                staff_id,
                role: role.into(),
            },
        }
    }

    pub fn service(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            actor: Actor::Service,
        }
    }

    pub fn staff_id(&self) -> Option<Uuid> {
        match &self.actor {
            Actor::Staff { staff_id, .. } => Some(*staff_id),
            Actor::Service => None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        match &self.actor {
            Actor::Staff { role: r, .. } => r == role,
            Actor::Service => true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::Forbidden("admin role required".to_string()))
        }
    }

    /// Admins and managers may review other people's requests.
    pub fn require_reviewer(&self) -> Result<(), DomainError> {
        if self.is_admin() || self.has_role(ROLE_MANAGER) {
            Ok(())
        } else {
            Err(DomainError::Forbidden("manager or admin role required".to_string()))
        }
    }

    /// The signed-in staff member, for operations that only make sense for a person.
    pub fn require_staff(&self) -> Result<Uuid, DomainError> {
        self.staff_id()
            .ok_or_else(|| DomainError::Forbidden("a staff session is required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_actor_is_privileged() {
        let ctx = TenantContext::service(Uuid::new_v4());
        assert!(ctx.require_admin().is_ok());
        assert!(ctx.require_reviewer().is_ok());
        assert!(ctx.require_staff().is_err());
    }

    #[test]
    fn test_role_gates() {
        let tenant = Uuid::new_v4();
        let employee = TenantContext::staff(tenant, Uuid::new_v4(), "employee");
        let manager = TenantContext::staff(tenant, Uuid::new_v4(), "manager");

        assert!(employee.require_admin().is_err());
        assert!(employee.require_reviewer().is_err());
        assert!(manager.require_reviewer().is_ok());
        assert!(manager.require_admin().is_err());
    }
}
