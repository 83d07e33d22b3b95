// ============================================================================
// BizDesk Core - Calendar Service
// File: crates/bizdesk-core/src/services/calendar_service.rs
// ============================================================================

use std::sync::Arc;

use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::context::TenantContext;
use crate::domain::Event;
use crate::error::DomainError;
use crate::repositories::EventRepository;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub attendee_ids: Option<Vec<Uuid>>,
}

pub struct CalendarService {
    events: Arc<dyn EventRepository>,
}

impl CalendarService {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self { events }
    }

    /// Events overlapping `[from, to]`.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pagination: Pagination,
    ) -> Result<Page<Event>, DomainError> {
        if let (Some(f), Some(t)) = (from, to) {
            if t < f {
                return Err(DomainError::Validation("`to` must not be before `from`".to_string()));
            }
        }
        self.events.list(&ctx.tenant_id, from, to, pagination).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: &Uuid) -> Result<Event, DomainError> {
        self.events
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event"))
    }

    pub async fn create(&self, ctx: &TenantContext, input: EventInput) -> Result<Event, DomainError> {
        let (title, starts_at) = match (input.title, input.starts_at) {
            (Some(title), Some(starts_at)) => (title, starts_at),
            _ => {
                return Err(DomainError::Validation(
                    "title and starts_at are required".to_string(),
                ))
            }
        };
        let ends_at = input.ends_at.unwrap_or(starts_at);
        let mut event = Event::new(ctx.tenant_id, title, starts_at, ends_at)?;
        event.description = input.description;
        event.location = input.location;
        event.all_day = input.all_day.unwrap_or(false);
        event.attendee_ids = input.attendee_ids.unwrap_or_default();
        event.created_by = ctx.staff_id();
        event.validate()?;
        self.events.create(&event).await
    }

    pub async fn update(&self, ctx: &TenantContext, id: &Uuid, input: EventInput) -> Result<Event, DomainError> {
        let mut event = self.get(ctx, id).await?;
        if let Some(title) = input.title {
            event.title = title.trim().to_string();
        }
        if input.description.is_some() {
            event.description = input.description;
        }
        if input.location.is_some() {
            event.location = input.location;
        }
        if let Some(all_day) = input.all_day {
            event.all_day = all_day;
        }
        if let Some(attendees) = input.attendee_ids {
            event.attendee_ids = attendees;
        }
        if input.starts_at.is_some() || input.ends_at.is_some() {
            let starts_at = input.starts_at.unwrap_or(event.starts_at);
            let ends_at = input.ends_at.unwrap_or(event.ends_at);
            event.reschedule(starts_at, ends_at)?;
        }
        event.validate()?;
        event.updated_at = Utc::now();
        self.events.update(&event).await
    }

    pub async fn delete(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        let mut event = self.get(ctx, id).await?;
        event.soft_delete();
        self.events.update(&event).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockEventRepository;
    use chrono::Duration;

    #[tokio::test]
    async fn test_inverted_window_rejected() {
        let svc = CalendarService::new(Arc::new(MockEventRepository::new()));
        let ctx = TenantContext::service(Uuid::new_v4());
        let now = Utc::now();
        let res = svc.list(&ctx, Some(now), Some(now - Duration::days(1)), Pagination::default()).await;
        assert!(matches!(res, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_window_valid() {
        let tenant = Uuid::new_v4();
        let now = Utc::now();
        let event = Event::new(tenant, "Feria".into(), now, now + Duration::hours(2)).unwrap();
        let id = event.id;
        let mut repo = MockEventRepository::new();
        repo.expect_find_by_id().returning(move |_, _| Ok(Some(event.clone())));
        repo.expect_update().never();

        let svc = CalendarService::new(Arc::new(repo));
        let input = EventInput {
            ends_at: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        let err = svc.update(&TenantContext::service(tenant), &id, input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_records_creator() {
        let tenant = Uuid::new_v4();
        let me = Uuid::new_v4();
        let mut repo = MockEventRepository::new();
        repo.expect_create().returning(|e| Ok(e.clone()));
        let svc = CalendarService::new(Arc::new(repo));
        let ev = svc
            .create(
                &TenantContext::staff(tenant, me, "employee"),
                EventInput {
                    title: Some("Inventario anual".into()),
                    starts_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ev.created_by, Some(me));
        assert_eq!(ev.starts_at, ev.ends_at);
    }
}
