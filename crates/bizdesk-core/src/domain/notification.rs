// ============================================================================
// BizDesk Core - Notifications
// File: crates/bizdesk-core/src/domain/notification.rs
// Description: Templates, delivery rules and the notifications they produce
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

pub const EVENT_PTO_REQUESTED: &str = "pto.requested";
pub const EVENT_PTO_REVIEWED: &str = "pto.reviewed";
pub const EVENT_TASK_ASSIGNED: &str = "task.assigned";
pub const EVENT_PAYROLL_APPROVED: &str = "payroll.approved";
pub const EVENT_PAYROLL_PAID: &str = "payroll.paid";
pub const EVENT_TAX_DOCUMENTS_SYNCED: &str = "tax_documents.synced";

pub const KNOWN_EVENTS: [&str; 6] = [
    EVENT_PTO_REQUESTED,
    EVENT_PTO_REVIEWED,
    EVENT_TASK_ASSIGNED,
    EVENT_PAYROLL_APPROVED,
    EVENT_PAYROLL_PAID,
    EVENT_TAX_DOCUMENTS_SYNCED,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    InApp,
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::InApp => "in_app",
            Channel::Email => "email",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_app" => Some(Channel::InApp),
            "email" => Some(Channel::Email),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(NotificationStatus::Pending),
            "sent" => Some(NotificationStatus::Sent),
            "failed" => Some(NotificationStatus::Failed),
            _ => None,
        }
    }
}

/// Who a rule notifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every active staff member holding the role.
    Role(String),
    /// One named staff member.
    Staff(Uuid),
    /// The staff member the event is about (requester, assignee...).
    Subject,
}

impl Recipient {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let s = s.trim();
        if s == "subject" {
            return Ok(Recipient::Subject);
        }
        if let Some(role) = s.strip_prefix("role:") {
            if role.is_empty() {
                return Err(DomainError::Validation("recipient role is empty".to_string()));
            }
            return Ok(Recipient::Role(role.to_lowercase()));
        }
        if let Some(id) = s.strip_prefix("staff:") {
            let id = Uuid::parse_str(id)
                .map_err(|_| DomainError::Validation(format!("invalid staff id in recipient: {}", id)))?;
            return Ok(Recipient::Staff(id));
        }
        Err(DomainError::Validation(format!(
            "recipient must be 'subject', 'role:<name>' or 'staff:<id>', got '{}'",
            s
        )))
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Role(r) => write!(f, "role:{}", r),
            Recipient::Staff(id) => write!(f, "staff:{}", id),
            Recipient::Subject => f.write_str("subject"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotificationTemplate {
    pub id: Uuid,
    pub tenant_id: Uuid,

    #[validate(length(min = 2, max = 100, message = "Template name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Subject must be between 1 and 200 characters"))]
    pub subject: String,

    #[validate(length(min = 1, max = 10000, message = "Body must be between 1 and 10000 characters"))]
    pub body: String,

    pub channel: Channel,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl NotificationTemplate {
    pub fn new(tenant_id: Uuid, name: String, subject: String, body: String, channel: Channel) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.trim().to_string(),
            subject,
            body,
            channel,
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
pub struct NotificationRule {
    pub id: Uuid,
    pub tenant_id: Uuid,

    #[validate(length(min = 3, max = 100, message = "Event type must be between 3 and 100 characters"))]
    pub event_type: String,

    pub template_id: Uuid,

    /// `subject`, `role:<name>` or `staff:<uuid>`.
    pub recipient: String,

    #[validate(range(min = 0, max = 10080, message = "Delay must be between 0 and 10080 minutes"))]
    pub delay_minutes: i32,

    pub is_active: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl NotificationRule {
    pub fn new(
        tenant_id: Uuid,
        event_type: String,
        template_id: Uuid,
        recipient: &Recipient,
        delay_minutes: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            event_type: event_type.trim().to_lowercase(),
            template_id,
            recipient: recipient.to_string(),
            delay_minutes,
            is_active: true,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn recipient(&self) -> Result<Recipient, DomainError> {
        Recipient::parse(&self.recipient)
    }

    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub recipient_staff_id: Uuid,
    pub rule_id: Option<Uuid>,
    pub event_type: String,
    pub channel: Channel,
    pub subject: String,
    pub body: String,
    pub status: NotificationStatus,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub error: Option<String>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Notification {
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        tenant_id: Uuid,
        recipient_staff_id: Uuid,
        rule_id: Option<Uuid>,
        event_type: &str,
        channel: Channel,
        subject: String,
        body: String,
        delay_minutes: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            recipient_staff_id,
            rule_id,
            event_type: event_type.to_string(),
            channel,
            subject,
            body,
            status: NotificationStatus::Pending,
            scheduled_at: now + Duration::minutes(i64::from(delay_minutes.max(0))),
            sent_at: None,
            read_at: None,
            error: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn mark_sent(&mut self) {
        let now = Utc::now();
        self.status = NotificationStatus::Sent;
        self.sent_at = Some(now);
        self.error = None;
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = NotificationStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_parse() {
        assert_eq!(Recipient::parse("subject").unwrap(), Recipient::Subject);
        assert_eq!(Recipient::parse("role:Admin").unwrap(), Recipient::Role("admin".into()));
        let id = Uuid::new_v4();
        assert_eq!(
            Recipient::parse(&format!("staff:{}", id)).unwrap(),
            Recipient::Staff(id)
        );
        assert!(Recipient::parse("role:").is_err());
        assert!(Recipient::parse("staff:nope").is_err());
        assert!(Recipient::parse("everyone").is_err());
    }

    #[test]
    fn test_recipient_display_roundtrip() {
        let r = Recipient::Role("manager".into());
        assert_eq!(Recipient::parse(&r.to_string()).unwrap(), r);
    }

    #[test]
    fn test_pending_schedules_with_delay() {
        let n = Notification::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            EVENT_PTO_REQUESTED,
            Channel::InApp,
            "s".into(),
            "b".into(),
            30,
        );
        let delay = n.scheduled_at - n.created_at;
        assert_eq!(delay.num_minutes(), 30);
        assert_eq!(n.status, NotificationStatus::Pending);
    }

    #[test]
    fn test_delivery_transitions() {
        let mut n = Notification::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            EVENT_TASK_ASSIGNED,
            Channel::Email,
            "s".into(),
            "b".into(),
            0,
        );
        n.mark_failed("smtp down");
        assert_eq!(n.status, NotificationStatus::Failed);
        n.mark_sent();
        assert_eq!(n.status, NotificationStatus::Sent);
        assert!(n.error.is_none());
    }
}
