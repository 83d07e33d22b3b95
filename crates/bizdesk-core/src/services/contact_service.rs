// ============================================================================
// BizDesk Core - Contact Service
// File: crates/bizdesk-core/src/services/contact_service.rs
// ============================================================================

use std::sync::Arc;

use bizdesk_shared::{Page, Pagination};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::context::TenantContext;
use crate::domain::rut;
use crate::domain::{Contact, ContactKind};
use crate::error::DomainError;
use crate::repositories::{ContactFilter, ContactRepository};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactInput {
    pub kind: Option<ContactKind>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub rut: Option<String>,
    pub notes: Option<String>,
}

pub struct ContactService {
    contacts: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(contacts: Arc<dyn ContactRepository>) -> Self {
        Self { contacts }
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: &ContactFilter,
        pagination: Pagination,
    ) -> Result<Page<Contact>, DomainError> {
        self.contacts.list(&ctx.tenant_id, filter, pagination).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: &Uuid) -> Result<Contact, DomainError> {
        self.contacts
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contact"))
    }

    pub async fn create(&self, ctx: &TenantContext, input: ContactInput) -> Result<Contact, DomainError> {
        let name = input
            .name
            .clone()
            .ok_or_else(|| DomainError::Validation("name is required".to_string()))?;
        let mut contact = Contact::new(ctx.tenant_id, input.kind.unwrap_or_default(), name);
        apply(&mut contact, input)?;
        contact.validate()?;
        self.contacts.create(&contact).await
    }

    pub async fn update(&self, ctx: &TenantContext, id: &Uuid, input: ContactInput) -> Result<Contact, DomainError> {
        let mut contact = self.get(ctx, id).await?;
        if let Some(name) = input.name.as_deref() {
            contact.name = name.trim().to_string();
        }
        if let Some(kind) = input.kind {
            contact.kind = kind;
        }
        apply(&mut contact, input)?;
        contact.validate()?;
        contact.updated_at = chrono::Utc::now();
        self.contacts.update(&contact).await
    }

    pub async fn delete(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        let mut contact = self.get(ctx, id).await?;
        contact.soft_delete();
        self.contacts.update(&contact).await?;
        Ok(())
    }
}

fn apply(contact: &mut Contact, input: ContactInput) -> Result<(), DomainError> {
    if input.email.is_some() {
        contact.email = input.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty());
    }
    if input.phone.is_some() {
        contact.phone = input.phone;
    }
    if input.company.is_some() {
        contact.company = input.company;
    }
    if input.rut.is_some() {
        contact.rut = rut::parse_optional(input.rut.as_deref())?.map(|r| r.to_string());
    }
    if input.notes.is_some() {
        contact.notes = input.notes;
    }
    Ok(())
}
