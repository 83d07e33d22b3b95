// ============================================================================
// BizDesk Core - Calendar Event
// File: crates/bizdesk-core/src/domain/event.rs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Event {
    pub id: Uuid,
    pub tenant_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Event title must be between 1 and 200 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub all_day: bool,
    pub attendee_ids: Vec<Uuid>,
    pub created_by: Option<Uuid>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(
        tenant_id: Uuid,
        title: String,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        check_window(starts_at, ends_at)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            title: title.trim().to_string(),
            description: None,
            location: None,
            starts_at,
            ends_at,
            all_day: false,
            attendee_ids: Vec::new(),
            created_by: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        })
    }

    pub fn reschedule(&mut self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), DomainError> {
        check_window(starts_at, ends_at)?;
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.starts_at <= to && from <= self.ends_at
    }

    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

fn check_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), DomainError> {
    if ends_at < starts_at {
        return Err(DomainError::Validation(
            "ends_at must not be before starts_at".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_window_validation() {
        let now = Utc::now();
        assert!(Event::new(Uuid::new_v4(), "Reunión".into(), now, now - Duration::hours(1)).is_err());
        let mut ev = Event::new(Uuid::new_v4(), "Reunión".into(), now, now + Duration::hours(1)).unwrap();
        assert!(ev.reschedule(now, now - Duration::minutes(1)).is_err());
        assert!(ev.reschedule(now + Duration::days(1), now + Duration::days(1)).is_ok());
    }

    #[test]
    fn test_overlaps() {
        let start = Utc::now();
        let ev = Event::new(Uuid::new_v4(), "Feria".into(), start, start + Duration::hours(3)).unwrap();
        assert!(ev.overlaps(start - Duration::days(1), start));
        assert!(ev.overlaps(start + Duration::hours(1), start + Duration::hours(2)));
        assert!(!ev.overlaps(start + Duration::hours(4), start + Duration::hours(5)));
    }
}
