// ============================================================================
// BizDesk Core - Payroll Service
// File: crates/bizdesk-core/src/services/payroll_service.rs
// ============================================================================
//! Builds payroll runs from active staff and approved unpaid leave, and
//! moves them through draft -> approved -> paid.

use std::collections::HashMap;
use std::sync::Arc;

use bizdesk_shared::constants::MAX_MONTHLY_AMOUNT_CLP;
use bizdesk_shared::{Page, Pagination};
use chrono::NaiveDate;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::context::TenantContext;
use crate::domain::notification::{EVENT_PAYROLL_APPROVED, EVENT_PAYROLL_PAID};
use crate::domain::payroll::{compute_line, LineInput};
use crate::domain::{PayrollRates, PayrollRun, PayrollStatus, PtoKind};
use crate::error::DomainError;
use crate::gateways::{DomainEvent, EventPublisher};
use crate::repositories::{PayrollRepository, PtoRepository, StaffRepository};

#[derive(Debug, Clone)]
pub struct NewPayrollRun {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Bonus per staff member, CLP.
    pub bonuses: HashMap<Uuid, i64>,
}

pub struct PayrollService {
    runs: Arc<dyn PayrollRepository>,
    staff: Arc<dyn StaffRepository>,
    pto: Arc<dyn PtoRepository>,
    events: Arc<dyn EventPublisher>,
    rates: PayrollRates,
}

impl PayrollService {
    pub fn new(
        runs: Arc<dyn PayrollRepository>,
        staff: Arc<dyn StaffRepository>,
        pto: Arc<dyn PtoRepository>,
        events: Arc<dyn EventPublisher>,
        rates: PayrollRates,
    ) -> Self {
        Self {
            runs,
            staff,
            pto,
            events,
            rates,
        }
    }

    pub async fn list(&self, ctx: &TenantContext, pagination: Pagination) -> Result<Page<PayrollRun>, DomainError> {
        ctx.require_admin()?;
        self.runs.list(&ctx.tenant_id, pagination).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: &Uuid) -> Result<PayrollRun, DomainError> {
        ctx.require_admin()?;
        self.runs
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payroll run"))
    }

    pub async fn create(&self, ctx: &TenantContext, input: NewPayrollRun) -> Result<PayrollRun, DomainError> {
        ctx.require_admin()?;
        let mut run = PayrollRun::new(ctx.tenant_id, input.period_start, input.period_end)?;

        if self
            .runs
            .has_overlapping(&ctx.tenant_id, run.period_start, run.period_end)
            .await?
        {
            return Err(DomainError::Conflict(
                "another payroll run already covers part of this period".to_string(),
            ));
        }

        for (staff_id, bonus) in &input.bonuses {
            if !(0..=MAX_MONTHLY_AMOUNT_CLP).contains(bonus) {
                return Err(DomainError::Validation(format!(
                    "bonus for {} must be between 0 and {}",
                    staff_id, MAX_MONTHLY_AMOUNT_CLP
                )));
            }
        }

        let unpaid_days = self.unpaid_days_by_staff(ctx, run.period_start, run.period_end).await?;
        let staff = self.staff.list_active(&ctx.tenant_id).await?;

        let lines = staff
            .iter()
            .filter(|s| s.base_salary > 0)
            .map(|s| {
                let line = LineInput {
                    staff_id: s.id,
                    staff_name: s.full_name.clone(),
                    base_salary: s.base_salary,
                    bonus: input.bonuses.get(&s.id).copied().unwrap_or(0),
                    unpaid_leave_days: unpaid_days.get(&s.id).copied().unwrap_or(0),
                };
                compute_line(run.id, &line, self.rates)
            })
            .collect::<Result<Vec<_>, _>>()?;

        if lines.is_empty() {
            return Err(DomainError::Validation(
                "no active staff with a base salary to pay".to_string(),
            ));
        }
        run.set_lines(lines)?;

        let created = self.runs.create(&run).await?;
        info!(
            tenant_id = %ctx.tenant_id,
            run_id = %created.id,
            lines = created.lines.len(),
            total_net = created.total_net,
            "Payroll run created"
        );
        Ok(created)
    }

    pub async fn approve(&self, ctx: &TenantContext, id: &Uuid) -> Result<PayrollRun, DomainError> {
        let mut run = self.get(ctx, id).await?;
        run.approve(ctx.staff_id())?;
        let saved = self.runs.update(&run, PayrollStatus::Draft).await?;
        info!(tenant_id = %ctx.tenant_id, run_id = %id, "Payroll run approved");
        self.announce(ctx, EVENT_PAYROLL_APPROVED, &saved).await;
        Ok(saved)
    }

    pub async fn mark_paid(&self, ctx: &TenantContext, id: &Uuid) -> Result<PayrollRun, DomainError> {
        let mut run = self.get(ctx, id).await?;
        run.mark_paid()?;
        let saved = self.runs.update(&run, PayrollStatus::Approved).await?;
        info!(tenant_id = %ctx.tenant_id, run_id = %id, "Payroll run paid");
        self.announce(ctx, EVENT_PAYROLL_PAID, &saved).await;
        Ok(saved)
    }

    pub async fn delete(&self, ctx: &TenantContext, id: &Uuid) -> Result<(), DomainError> {
        let mut run = self.get(ctx, id).await?;
        run.soft_delete()?;
        self.runs.update(&run, PayrollStatus::Draft).await?;
        info!(tenant_id = %ctx.tenant_id, run_id = %id, "Payroll run deleted");
        Ok(())
    }

    /// Business days of approved unpaid leave inside the period, per staff member.
    async fn unpaid_days_by_staff(
        &self,
        ctx: &TenantContext,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<Uuid, u32>, DomainError> {
        let leave = self
            .pto
            .find_approved_in_period(&ctx.tenant_id, PtoKind::Unpaid, start, end)
            .await?;
        let mut days: HashMap<Uuid, u32> = HashMap::new();
        for request in &leave {
            *days.entry(request.staff_id).or_default() += request.business_days_within(start, end);
        }
        Ok(days)
    }

    async fn announce(&self, ctx: &TenantContext, event_type: &str, run: &PayrollRun) {
        self.events
            .publish(DomainEvent::new(
                ctx.tenant_id,
                event_type,
                None,
                json!({
                    "run_id": run.id,
                    "period_start": run.period_start,
                    "period_end": run.period_end,
                    "total_net": run.total_net,
                    "status": run.status.as_str(),
                }),
            ))
            .await;
    }
}
