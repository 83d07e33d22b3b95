// ============================================================================
// BizDesk Infrastructure - PostgreSQL Notification Repositories
// File: crates/bizdesk-infrastructure/src/database/postgres/notification_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use bizdesk_core::domain::{Channel, Notification, NotificationRule, NotificationStatus, NotificationTemplate};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::{
    NotificationRepository, NotificationRuleRepository, NotificationTemplateRepository,
};

use crate::database::db_error;

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub struct PgNotificationTemplateRepository {
    pool: PgPool,
}

impl PgNotificationTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    subject: String,
    body: String,
    channel: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<TemplateRow> for NotificationTemplate {
    fn from(row: TemplateRow) -> Self {
        NotificationTemplate {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            subject: row.subject,
            body: row.body,
            channel: Channel::from_str(&row.channel).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const TEMPLATE_COLUMNS: &str =
    "id, tenant_id, name, subject, body, channel, created_at, updated_at, is_deleted, deleted_at";

#[async_trait]
impl NotificationTemplateRepository for PgNotificationTemplateRepository {
    async fn list(&self, tenant_id: &Uuid) -> Result<Vec<NotificationTemplate>, DomainError> {
        let rows: Vec<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {} FROM notification_templates WHERE tenant_id = $1 AND NOT is_deleted ORDER BY name",
            TEMPLATE_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("notification template", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<NotificationTemplate>, DomainError> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {} FROM notification_templates WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            TEMPLATE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("notification template", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, template: &NotificationTemplate) -> Result<NotificationTemplate, DomainError> {
        let row: TemplateRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO notification_templates ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            TEMPLATE_COLUMNS, TEMPLATE_COLUMNS
        ))
        .bind(template.id)
        .bind(template.tenant_id)
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body)
        .bind(template.channel.as_str())
        .bind(template.created_at)
        .bind(template.updated_at)
        .bind(template.is_deleted)
        .bind(template.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("notification template", e))?;

        Ok(row.into())
    }

    async fn update(&self, template: &NotificationTemplate) -> Result<NotificationTemplate, DomainError> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            r#"
            UPDATE notification_templates
            SET name = $3, subject = $4, body = $5, channel = $6,
                updated_at = $7, is_deleted = $8, deleted_at = $9
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            TEMPLATE_COLUMNS
        ))
        .bind(template.tenant_id)
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body)
        .bind(template.channel.as_str())
        .bind(template.updated_at)
        .bind(template.is_deleted)
        .bind(template.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("notification template", e))?;

        row.map(Into::into)
            .ok_or_else(|| DomainError::not_found("Notification template"))
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub struct PgNotificationRuleRepository {
    pool: PgPool,
}

impl PgNotificationRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RuleRow {
    id: Uuid,
    tenant_id: Uuid,
    event_type: String,
    template_id: Uuid,
    recipient: String,
    delay_minutes: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<RuleRow> for NotificationRule {
    fn from(row: RuleRow) -> Self {
        NotificationRule {
            id: row.id,
            tenant_id: row.tenant_id,
            event_type: row.event_type,
            template_id: row.template_id,
            recipient: row.recipient,
            delay_minutes: row.delay_minutes,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const RULE_COLUMNS: &str = r#"id, tenant_id, event_type, template_id, recipient, delay_minutes, is_active,
    created_at, updated_at, is_deleted, deleted_at"#;

#[async_trait]
impl NotificationRuleRepository for PgNotificationRuleRepository {
    async fn list(&self, tenant_id: &Uuid) -> Result<Vec<NotificationRule>, DomainError> {
        let rows: Vec<RuleRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM notification_rules WHERE tenant_id = $1 AND NOT is_deleted
               ORDER BY event_type, created_at"#,
            RULE_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("notification rule", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<NotificationRule>, DomainError> {
        let row: Option<RuleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM notification_rules WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            RULE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("notification rule", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_active_by_event(
        &self,
        tenant_id: &Uuid,
        event_type: &str,
    ) -> Result<Vec<NotificationRule>, DomainError> {
        let rows: Vec<RuleRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM notification_rules
               WHERE tenant_id = $1 AND event_type = $2 AND is_active AND NOT is_deleted
               ORDER BY created_at"#,
            RULE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(event_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("notification rule", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, rule: &NotificationRule) -> Result<NotificationRule, DomainError> {
        let row: RuleRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO notification_rules ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            RULE_COLUMNS, RULE_COLUMNS
        ))
        .bind(rule.id)
        .bind(rule.tenant_id)
        .bind(&rule.event_type)
        .bind(rule.template_id)
        .bind(&rule.recipient)
        .bind(rule.delay_minutes)
        .bind(rule.is_active)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .bind(rule.is_deleted)
        .bind(rule.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("notification rule", e))?;

        Ok(row.into())
    }

    async fn update(&self, rule: &NotificationRule) -> Result<NotificationRule, DomainError> {
        let row: Option<RuleRow> = sqlx::query_as(&format!(
            r#"
            UPDATE notification_rules
            SET event_type = $3, template_id = $4, recipient = $5, delay_minutes = $6, is_active = $7,
                updated_at = $8, is_deleted = $9, deleted_at = $10
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            RULE_COLUMNS
        ))
        .bind(rule.tenant_id)
        .bind(rule.id)
        .bind(&rule.event_type)
        .bind(rule.template_id)
        .bind(&rule.recipient)
        .bind(rule.delay_minutes)
        .bind(rule.is_active)
        .bind(rule.updated_at)
        .bind(rule.is_deleted)
        .bind(rule.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("notification rule", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Notification rule"))
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    tenant_id: Uuid,
    recipient_staff_id: Uuid,
    rule_id: Option<Uuid>,
    event_type: String,
    channel: String,
    subject: String,
    body: String,
    status: String,
    scheduled_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    read_at: Option<DateTime<Utc>>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DomainError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let status = NotificationStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::DatabaseError(format!("unknown notification status '{}'", row.status)))?;
        Ok(Notification {
            id: row.id,
            tenant_id: row.tenant_id,
            recipient_staff_id: row.recipient_staff_id,
            rule_id: row.rule_id,
            event_type: row.event_type,
            channel: Channel::from_str(&row.channel).unwrap_or_default(),
            subject: row.subject,
            body: row.body,
            status,
            scheduled_at: row.scheduled_at,
            sent_at: row.sent_at,
            read_at: row.read_at,
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        })
    }
}

fn convert(rows: Vec<NotificationRow>) -> Result<Vec<Notification>, DomainError> {
    rows.into_iter().map(Notification::try_from).collect()
}

const NOTIFICATION_COLUMNS: &str = r#"id, tenant_id, recipient_staff_id, rule_id, event_type, channel, subject,
    body, status, scheduled_at, sent_at, read_at, error, created_at, updated_at, is_deleted, deleted_at"#;

const INBOX: &str = r#"
    WHERE tenant_id = $1 AND recipient_staff_id = $2 AND NOT is_deleted
      AND channel = 'in_app' AND status = 'sent'
      AND (NOT $3 OR read_at IS NULL)
"#;

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification, DomainError> {
        let row: NotificationRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO notifications ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS, NOTIFICATION_COLUMNS
        ))
        .bind(notification.id)
        .bind(notification.tenant_id)
        .bind(notification.recipient_staff_id)
        .bind(notification.rule_id)
        .bind(&notification.event_type)
        .bind(notification.channel.as_str())
        .bind(&notification.subject)
        .bind(&notification.body)
        .bind(notification.status.as_str())
        .bind(notification.scheduled_at)
        .bind(notification.sent_at)
        .bind(notification.read_at)
        .bind(&notification.error)
        .bind(notification.created_at)
        .bind(notification.updated_at)
        .bind(notification.is_deleted)
        .bind(notification.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("notification", e))?;

        row.try_into()
    }

    async fn update(&self, notification: &Notification) -> Result<Notification, DomainError> {
        let row: Option<NotificationRow> = sqlx::query_as(&format!(
            r#"
            UPDATE notifications
            SET status = $3, sent_at = $4, read_at = $5, error = $6,
                updated_at = $7, is_deleted = $8, deleted_at = $9
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(notification.tenant_id)
        .bind(notification.id)
        .bind(notification.status.as_str())
        .bind(notification.sent_at)
        .bind(notification.read_at)
        .bind(&notification.error)
        .bind(notification.updated_at)
        .bind(notification.is_deleted)
        .bind(notification.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("notification", e))?;

        row.map(Notification::try_from)
            .transpose()?
            .ok_or_else(|| DomainError::not_found("Notification"))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Notification>, DomainError> {
        let row: Option<NotificationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM notifications WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            NOTIFICATION_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("notification", e))?;

        row.map(Notification::try_from).transpose()
    }

    async fn list_for_staff(
        &self,
        tenant_id: &Uuid,
        staff_id: &Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> Result<Page<Notification>, DomainError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM notifications {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            NOTIFICATION_COLUMNS, INBOX
        ))
        .bind(tenant_id)
        .bind(staff_id)
        .bind(unread_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("notification", e))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notifications {}", INBOX))
            .bind(tenant_id)
            .bind(staff_id)
            .bind(unread_only)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("notification", e))?;

        Ok(Page::new(convert(rows)?, pagination, total))
    }

    async fn mark_read(&self, tenant_id: &Uuid, staff_id: &Uuid, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"UPDATE notifications SET read_at = COALESCE(read_at, NOW()), updated_at = NOW()
               WHERE tenant_id = $1 AND recipient_staff_id = $2 AND id = $3 AND NOT is_deleted"#,
        )
        .bind(tenant_id)
        .bind(staff_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("notification", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, tenant_id: &Uuid, staff_id: &Uuid) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"UPDATE notifications SET read_at = NOW(), updated_at = NOW()
               WHERE tenant_id = $1 AND recipient_staff_id = $2 AND read_at IS NULL
                 AND channel = 'in_app' AND status = 'sent' AND NOT is_deleted"#,
        )
        .bind(tenant_id)
        .bind(staff_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("notification", e))?;

        Ok(result.rows_affected())
    }

    async fn list_pending(&self) -> Result<Vec<Notification>, DomainError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM notifications WHERE status = 'pending' AND NOT is_deleted
               ORDER BY scheduled_at"#,
            NOTIFICATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("notification", e))?;

        convert(rows)
    }
}
