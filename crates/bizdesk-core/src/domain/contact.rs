// ============================================================================
// BizDesk Core - Contact
// File: crates/bizdesk-core/src/domain/contact.rs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Customer,
    Supplier,
    #[default]
    Other,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Customer => "customer",
            ContactKind::Supplier => "supplier",
            ContactKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(ContactKind::Customer),
            "supplier" => Some(ContactKind::Supplier),
            "other" => Some(ContactKind::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Contact {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub kind: ContactKind,

    #[validate(length(min = 1, max = 150, message = "Contact name must be between 1 and 150 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email"))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub company: Option<String>,
    pub rut: Option<String>,
    pub notes: Option<String>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Contact {
    pub fn new(tenant_id: Uuid, kind: ContactKind, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            kind,
            name: name.trim().to_string(),
            email: None,
            phone: None,
            company: None,
            rut: None,
            notes: None,
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
