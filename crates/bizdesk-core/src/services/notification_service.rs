// ============================================================================
// BizDesk Core - Notification Service
// File: crates/bizdesk-core/src/services/notification_service.rs
// ============================================================================
//! Template and rule management, event fan-out to recipients, and the
//! signed-in staff member's inbox.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use handlebars::{Handlebars, Template};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::context::TenantContext;
use crate::domain::notification::KNOWN_EVENTS;
use crate::domain::{Channel, Notification, NotificationRule, NotificationTemplate, Recipient};
use crate::error::DomainError;
use crate::gateways::{DomainEvent, EventPublisher};
use crate::repositories::{
    NotificationRepository, NotificationRuleRepository, NotificationTemplateRepository, StaffRepository,
};
use crate::services::notification_dispatcher::DispatchHandle;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateInput {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub channel: Option<Channel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleInput {
    pub event_type: Option<String>,
    pub template_id: Option<Uuid>,
    pub recipient: Option<String>,
    pub delay_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

pub struct NotificationService {
    templates: Arc<dyn NotificationTemplateRepository>,
    rules: Arc<dyn NotificationRuleRepository>,
    notifications: Arc<dyn NotificationRepository>,
    staff: Arc<dyn StaffRepository>,
    dispatch: DispatchHandle,
    renderer: Handlebars<'static>,
}

impl NotificationService {
    pub fn new(
        templates: Arc<dyn NotificationTemplateRepository>,
        rules: Arc<dyn NotificationRuleRepository>,
        notifications: Arc<dyn NotificationRepository>,
        staff: Arc<dyn StaffRepository>,
        dispatch: DispatchHandle,
    ) -> Self {
        let mut renderer = Handlebars::new();
        renderer.register_escape_fn(handlebars::no_escape);
        Self {
            templates,
            rules,
            notifications,
            staff,
            dispatch,
            renderer,
        }
    }

    // ------------------------------------------------------------ templates

    pub async fn list_templates(&self, ctx: &TenantContext) -> Result<Vec<NotificationTemplate>, DomainError> {
        ctx.require_admin()?;
        self.templates.list(&ctx.tenant_id).await
    }

    pub async fn create_template(&self, ctx: &TenantContext, input: TemplateInput) -> Result<NotificationTemplate, DomainError> {
        ctx.require_admin()?;
        let (name, subject, body) = match (input.name, input.subject, input.body) {
            (Some(n), Some(s), Some(b)) => (n, s, b),
            _ => {
                return Err(DomainError::Validation(
                    "name, subject and body are required".to_string(),
                ))
            }
        };
        let template = NotificationTemplate::new(ctx.tenant_id, name, subject, body, input.channel.unwrap_or_default());
        template.validate()?;
        check_syntax(&template)?;
        self.ensure_unique_name(ctx, &template).await?;

        let created = self.templates.create(&template).await?;
        info!(tenant_id = %ctx.tenant_id, template_id = %created.id, "Notification template created");
        Ok(created)
    }

    pub async fn update_template(
        &self,
        ctx: &TenantContext,
        id: &Uuid,
        input: TemplateInput,
    ) -> Result<NotificationTemplate, DomainError> {
        ctx.require_admin()?;
        let mut template = self.find_template(ctx, id).await?;
        if let Some(name) = input.name {
            template.name = name.trim().to_string();
        }
        if let Some(subject) = input.subject {
            template.subject = subject;
        }
        if let Some(body) = input.body {
            template.body = body;
        }
        if let Some(channel) = input.channel {
            template.channel = channel;
        }
        template.validate()?;
        check_syntax(&template)?;
        self.ensure_unique_name(ctx, &template).await?;
        template.updated_at = chrono::Utc::now();
        self.templates.update(&template).await
    }

    pub async fn delete_template(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        ctx.require_admin()?;
        let mut template = self.find_template(ctx, id).await?;
        let used = self
            .rules
            .list(&ctx.tenant_id)
            .await?
            .iter()
            .filter(|r| r.template_id == template.id)
            .count();
        if used > 0 {
            return Err(DomainError::Conflict(format!(
                "template is used by {} rule(s)",
                used
            )));
        }
        template.soft_delete();
        self.templates.update(&template).await?;
        Ok(())
    }

    // ---------------------------------------------------------------- rules

    pub async fn list_rules(&self, ctx: &TenantContext) -> Result<Vec<NotificationRule>, DomainError> {
        ctx.require_admin()?;
        self.rules.list(&ctx.tenant_id).await
    }

    pub async fn create_rule(&self, ctx: &TenantContext, input: RuleInput) -> Result<NotificationRule, DomainError> {
        ctx.require_admin()?;
        let (event_type, template_id, recipient) = match (input.event_type, input.template_id, input.recipient) {
            (Some(e), Some(t), Some(r)) => (e, t, r),
            _ => {
                return Err(DomainError::Validation(
                    "event_type, template_id and recipient are required".to_string(),
                ))
            }
        };
        check_event_type(&event_type)?;
        self.find_template(ctx, &template_id).await?;
        let recipient = Recipient::parse(&recipient)?;

        let mut rule = NotificationRule::new(
            ctx.tenant_id,
            event_type,
            template_id,
            &recipient,
            input.delay_minutes.unwrap_or(0),
        );
        if let Some(active) = input.is_active {
            rule.is_active = active;
        }
        rule.validate()?;
        self.rules.create(&rule).await
    }

    pub async fn update_rule(&self, ctx: &TenantContext, id: &Uuid, input: RuleInput) -> Result<NotificationRule, DomainError> {
        ctx.require_admin()?;
        let mut rule = self.find_rule(ctx, id).await?;
        if let Some(event_type) = input.event_type {
            check_event_type(&event_type)?;
            rule.event_type = event_type.trim().to_lowercase();
        }
        if let Some(template_id) = input.template_id {
            self.find_template(ctx, &template_id).await?;
            rule.template_id = template_id;
        }
        if let Some(recipient) = input.recipient {
            rule.recipient = Recipient::parse(&recipient)?.to_string();
        }
        if let Some(delay) = input.delay_minutes {
            rule.delay_minutes = delay;
        }
        if let Some(active) = input.is_active {
            rule.is_active = active;
        }
        rule.validate()?;
        rule.updated_at = chrono::Utc::now();
        self.rules.update(&rule).await
    }

    pub async fn delete_rule(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        ctx.require_admin()?;
        let mut rule = self.find_rule(ctx, id).await?;
        rule.soft_delete();
        self.rules.update(&rule).await?;
        Ok(())
    }

    // ---------------------------------------------------------------- inbox

    pub async fn list_mine(
        &self,
        ctx: &TenantContext,
        unread_only: bool,
        pagination: Pagination,
    ) -> Result<Page<Notification>, DomainError> {
        let me = ctx.require_staff()?;
        self.notifications
            .list_for_staff(&ctx.tenant_id, &me, unread_only, pagination)
            .await
    }

    pub async fn mark_read(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        let me = ctx.require_staff()?;
        if self.notifications.mark_read(&ctx.tenant_id, &me, id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("Notification"))
        }
    }

    pub async fn mark_all_read(&self, ctx: &TenantContext) -> Result<u64, DomainError> {
        let me = ctx.require_staff()?;
        self.notifications.mark_all_read(&ctx.tenant_id, &me).await
    }

    // -------------------------------------------------------------- fan-out

    /// Creates and enqueues one notification per rule and recipient.
    /// Returns how many were created. A broken rule is skipped, not fatal.
    pub async fn trigger(&self, event: &DomainEvent) -> Result<usize, DomainError> {
        let rules = self
            .rules
            .find_active_by_event(&event.tenant_id, &event.event_type)
            .await?;
        if rules.is_empty() {
            debug!(event_type = %event.event_type, "No notification rules for event");
            return Ok(0);
        }

        let mut created = 0;
        for rule in rules {
            match self.fan_out(event, &rule).await {
                Ok(n) => created += n,
                Err(e) => warn!(rule_id = %rule.id, event_type = %event.event_type, "Notification rule skipped: {}", e),
            }
        }
        Ok(created)
    }

    async fn fan_out(&self, event: &DomainEvent, rule: &NotificationRule) -> Result<usize, DomainError> {
        let template = self
            .templates
            .find_by_id(&event.tenant_id, &rule.template_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Notification template"))?;

        let subject = self.render(&template.subject, &event.vars)?;
        let body = self.render(&template.body, &event.vars)?;

        let recipients = self.resolve_recipients(event, &rule.recipient()?).await?;
        for staff_id in &recipients {
            let notification = Notification::pending(
                event.tenant_id,
                *staff_id,
                Some(rule.id),
                &event.event_type,
                template.channel,
                subject.clone(),
                body.clone(),
                rule.delay_minutes,
            );
            let stored = self.notifications.create(&notification).await?;
            self.dispatch.enqueue(stored);
        }
        Ok(recipients.len())
    }

    async fn resolve_recipients(&self, event: &DomainEvent, recipient: &Recipient) -> Result<BTreeSet<Uuid>, DomainError> {
        let ids = match recipient {
            Recipient::Subject => event.subject_staff_id.into_iter().collect(),
            Recipient::Staff(id) => self
                .staff
                .find_by_id(&event.tenant_id, id)
                .await?
                .filter(|s| s.is_active)
                .map(|s| s.id)
                .into_iter()
                .collect(),
            Recipient::Role(role) => self
                .staff
                .find_active_by_role(&event.tenant_id, role)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect(),
        };
        Ok(ids)
    }

    fn render(&self, source: &str, vars: &serde_json::Value) -> Result<String, DomainError> {
        self.renderer
            .render_template(source, vars)
            .map_err(|e| DomainError::Validation(format!("template render failed: {}", e)))
    }

    async fn find_template(&self, ctx: &TenantContext, id: &Uuid) -> Result<NotificationTemplate, DomainError> {
        self.templates
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Notification template"))
    }

    async fn find_rule(&self, ctx: &TenantContext, id: &Uuid) -> Result<NotificationRule, DomainError> {
        self.rules
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Notification rule"))
    }

    async fn ensure_unique_name(&self, ctx: &TenantContext, template: &NotificationTemplate) -> Result<(), DomainError> {
        let clash = self
            .templates
            .list(&ctx.tenant_id)
            .await?
            .into_iter()
            .any(|t| t.id != template.id && t.name.eq_ignore_ascii_case(&template.name));
        if clash {
            return Err(DomainError::Conflict(format!(
                "a template named '{}' already exists",
                template.name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for NotificationService {
    async fn publish(&self, event: DomainEvent) {
        match self.trigger(&event).await {
            Ok(0) => {}
            Ok(n) => info!(tenant_id = %event.tenant_id, event_type = %event.event_type, count = n, "Notifications queued"),
            Err(e) => warn!(tenant_id = %event.tenant_id, event_type = %event.event_type, "Notification trigger failed: {}", e),
        }
    }
}

fn check_syntax(template: &NotificationTemplate) -> Result<(), DomainError> {
    for (field, source) in [("subject", &template.subject), ("body", &template.body)] {
        Template::compile(source)
            .map_err(|e| DomainError::Validation(format!("invalid template {}: {}", field, e)))?;
    }
    Ok(())
}

fn check_event_type(event_type: &str) -> Result<(), DomainError> {
    let normalized = event_type.trim().to_lowercase();
    if KNOWN_EVENTS.contains(&normalized.as_str()) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "unknown event type '{}'; expected one of {}",
            event_type,
            KNOWN_EVENTS.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, Staff};
    use crate::repositories::{
        MockNotificationRepository, MockNotificationRuleRepository, MockNotificationTemplateRepository,
        MockStaffRepository,
    };
    use serde_json::json;

    struct Mocks {
        templates: MockNotificationTemplateRepository,
        rules: MockNotificationRuleRepository,
        notifications: MockNotificationRepository,
        staff: MockStaffRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                templates: MockNotificationTemplateRepository::new(),
                rules: MockNotificationRuleRepository::new(),
                notifications: MockNotificationRepository::new(),
                staff: MockStaffRepository::new(),
            }
        }

        fn build(self) -> (NotificationService, tokio::sync::mpsc::UnboundedReceiver<Notification>) {
            let (handle, rx) = DispatchHandle::channel();
            let svc = NotificationService::new(
                Arc::new(self.templates),
                Arc::new(self.rules),
                Arc::new(self.notifications),
                Arc::new(self.staff),
                handle,
            );
            (svc, rx)
        }
    }

    fn admin(tenant: Uuid) -> TenantContext {
        TenantContext::staff(tenant, Uuid::new_v4(), "admin")
    }

    #[tokio::test]
    async fn test_template_syntax_checked() {
        let mut m = Mocks::new();
        m.templates.expect_list().returning(|_| Ok(vec![]));
        let (svc, _rx) = m.build();
        let input = TemplateInput {
            name: Some("PTO".into()),
            subject: Some("Solicitud de {{staff_name".into()),
            body: Some("x".into()),
            channel: None,
        };
        let err = svc.create_template(&admin(Uuid::new_v4()), input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_template_name_unique() {
        let tenant = Uuid::new_v4();
        let existing = NotificationTemplate::new(tenant, "PTO".into(), "s".into(), "b".into(), Channel::InApp);
        let mut m = Mocks::new();
        m.templates.expect_list().returning(move |_| Ok(vec![existing.clone()]));
        let (svc, _rx) = m.build();
        let input = TemplateInput {
            name: Some("pto".into()),
            subject: Some("s".into()),
            body: Some("b".into()),
            channel: None,
        };
        let err = svc.create_template(&admin(tenant), input).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_rule_rejects_unknown_event_and_bad_delay() {
        let tenant = Uuid::new_v4();
        let template = NotificationTemplate::new(tenant, "PTO".into(), "s".into(), "b".into(), Channel::InApp);
        let template_id = template.id;
        let mut m = Mocks::new();
        m.templates.expect_find_by_id().returning(move |_, _| Ok(Some(template.clone())));
        let (svc, _rx) = m.build();

        let unknown = RuleInput {
            event_type: Some("invoice.paid".into()),
            template_id: Some(template_id),
            recipient: Some("subject".into()),
            ..Default::default()
        };
        assert!(svc.create_rule(&admin(tenant), unknown).await.is_err());

        let too_late = RuleInput {
            event_type: Some("pto.requested".into()),
            template_id: Some(template_id),
            recipient: Some("role:manager".into()),
            delay_minutes: Some(20_000),
            ..Default::default()
        };
        assert!(matches!(
            svc.create_rule(&admin(tenant), too_late).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_trigger_renders_and_enqueues_per_recipient() {
        let tenant = Uuid::new_v4();
        let template = NotificationTemplate::new(
            tenant,
            "PTO pedido".into(),
            "Solicitud de {{staff_name}}".into(),
            "{{staff_name}} pidió {{days}} día(s) desde {{start_date}}".into(),
            Channel::InApp,
        );
        let rule = NotificationRule::new(
            tenant,
            "pto.requested".into(),
            template.id,
            &Recipient::Role("manager".into()),
            15,
        );
        let role = Role::new(tenant, "manager".into(), None, vec![]).unwrap();
        let managers = vec![
            Staff::new(tenant, "m1@pansur.cl".into(), "M1".into(), &role),
            Staff::new(tenant, "m2@pansur.cl".into(), "M2".into(), &role),
        ];

        let mut m = Mocks::new();
        m.rules.expect_find_active_by_event().returning(move |_, _| Ok(vec![rule.clone()]));
        m.templates.expect_find_by_id().returning(move |_, _| Ok(Some(template.clone())));
        m.staff
            .expect_find_active_by_role()
            .withf(|_, role| role == "manager")
            .returning(move |_, _| Ok(managers.clone()));
        m.notifications
            .expect_create()
            .times(2)
            .returning(|n| Ok(n.clone()));
        let (svc, mut rx) = m.build();

        let event = DomainEvent::new(
            tenant,
            "pto.requested",
            Some(Uuid::new_v4()),
            json!({"staff_name": "Luis", "days": 3, "start_date": "2024-03-04"}),
        );
        assert_eq!(svc.trigger(&event).await.unwrap(), 2);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.subject, "Solicitud de Luis");
        assert_eq!(first.body, "Luis pidió 3 día(s) desde 2024-03-04");
        assert_eq!((first.scheduled_at - first.created_at).num_minutes(), 15);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_subject_recipient_without_subject_creates_nothing() {
        let tenant = Uuid::new_v4();
        let template = NotificationTemplate::new(tenant, "Pago".into(), "s".into(), "b".into(), Channel::InApp);
        let rule = NotificationRule::new(tenant, "payroll.paid".into(), template.id, &Recipient::Subject, 0);

        let mut m = Mocks::new();
        m.rules.expect_find_active_by_event().returning(move |_, _| Ok(vec![rule.clone()]));
        m.templates.expect_find_by_id().returning(move |_, _| Ok(Some(template.clone())));
        m.notifications.expect_create().never();
        let (svc, _rx) = m.build();

        let event = DomainEvent::new(tenant, "payroll.paid", None, json!({}));
        assert_eq!(svc.trigger(&event).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_of_foreign_notification_is_not_found() {
        let mut m = Mocks::new();
        m.notifications.expect_mark_read().returning(|_, _, _| Ok(false));
        let (svc, _rx) = m.build();
        let ctx = TenantContext::staff(Uuid::new_v4(), Uuid::new_v4(), "employee");
        let err = svc.mark_read(&ctx, &Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
