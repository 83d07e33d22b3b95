// ============================================================================
// BizDesk Core - Tenant Entity
// File: crates/bizdesk-core/src/domain/tenant.rs
// Description: Customer organization; every other row is scoped to one
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Tenant {
    pub id: Uuid,

    #[validate(length(min = 2, max = 100, message = "Tenant name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(length(min = 2, max = 100, message = "Slug must be between 2 and 100 characters"))]
    pub slug: String,

    /// Company RUT, canonical form.
    pub rut: Option<String>,

    pub is_active: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Tenant {
    pub fn new(
        name: String,
        slug: String,
        rut: Option<String>,
    ) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let tenant = Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            slug: slug.trim().to_lowercase(),
            rut,
            is_active: true,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        };

        tenant.validate()?;
        Ok(tenant)
    }

    /// Inactive or deleted tenants cannot be used.
    pub fn is_usable(&self) -> bool {
        self.is_active && !self.is_deleted
    }

    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.is_active = false;
        self.updated_at = now;
    }
}
