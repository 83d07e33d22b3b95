// ============================================================================
// BizDesk Core - Payroll
// File: crates/bizdesk-core/src/domain/payroll.rs
// Description: Monthly payroll runs and the per-staff line calculation
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Salary days per month used to price one day of unpaid leave.
pub const DAYS_PER_SALARY_MONTH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayrollStatus {
    Draft,
    Approved,
    Paid,
}

impl PayrollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollStatus::Draft => "draft",
            PayrollStatus::Approved => "approved",
            PayrollStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PayrollStatus::Draft),
            "approved" => Some(PayrollStatus::Approved),
            "paid" => Some(PayrollStatus::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayrollRates {
    pub pension_rate: f64,
    pub health_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollLine {
    pub id: Uuid,
    pub payroll_run_id: Uuid,
    pub staff_id: Uuid,
    pub staff_name: String,
    pub base_salary: i64,
    pub bonus: i64,
    pub unpaid_leave_days: i32,
    pub unpaid_leave_deduction: i64,
    pub pension: i64,
    pub health: i64,
    pub gross: i64,
    pub net: i64,
}

impl PayrollLine {
    pub fn total_deductions(&self) -> Option<i64> {
        self.pension
            .checked_add(self.health)?
            .checked_add(self.unpaid_leave_deduction)
    }
}

/// Inputs for one staff member's line.
#[derive(Debug, Clone)]
pub struct LineInput {
    pub staff_id: Uuid,
    pub staff_name: String,
    pub base_salary: i64,
    pub bonus: i64,
    pub unpaid_leave_days: u32,
}

fn round_clp(value: f64) -> i64 {
    value.round() as i64
}

fn out_of_range(what: &str) -> DomainError {
    DomainError::Validation(format!("payroll {} out of range", what))
}

fn checked_total(mut values: impl Iterator<Item = Option<i64>>, what: &str) -> Result<i64, DomainError> {
    values
        .try_fold(0i64, |acc, v| acc.checked_add(v?))
        .ok_or_else(|| out_of_range(what))
}

pub fn compute_line(run_id: Uuid, input: &LineInput, rates: PayrollRates) -> Result<PayrollLine, DomainError> {
    let gross = input
        .base_salary
        .checked_add(input.bonus)
        .ok_or_else(|| out_of_range("gross"))?;
    let unpaid_leave_deduction = round_clp(
        input.base_salary as f64 / DAYS_PER_SALARY_MONTH * f64::from(input.unpaid_leave_days),
    );
    let pension = round_clp(gross as f64 * rates.pension_rate);
    let health = round_clp(gross as f64 * rates.health_rate);
    let net = gross
        .checked_sub(pension)
        .and_then(|v| v.checked_sub(health))
        .and_then(|v| v.checked_sub(unpaid_leave_deduction))
        .ok_or_else(|| out_of_range("net"))?
        .max(0);

    Ok(PayrollLine {
        id: Uuid::new_v4(),
        payroll_run_id: run_id,
        staff_id: input.staff_id,
        staff_name: input.staff_name.clone(),
        base_salary: input.base_salary,
        bonus: input.bonus,
        unpaid_leave_days: input.unpaid_leave_days as i32,
        unpaid_leave_deduction,
        pension,
        health,
        gross,
        net,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRun {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: PayrollStatus,
    pub total_gross: i64,
    pub total_deductions: i64,
    pub total_net: i64,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Empty when loaded in a list.
    pub lines: Vec<PayrollLine>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PayrollRun {
    pub fn new(
        tenant_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Self, DomainError> {
        if period_end < period_start {
            return Err(DomainError::Validation(
                "period_end must not be before period_start".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            period_start,
            period_end,
            status: PayrollStatus::Draft,
            total_gross: 0,
            total_deductions: 0,
            total_net: 0,
            approved_by: None,
            approved_at: None,
            paid_at: None,
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        })
    }

    pub fn set_lines(&mut self, lines: Vec<PayrollLine>) -> Result<(), DomainError> {
        self.total_gross = checked_total(lines.iter().map(|l| Some(l.gross)), "total gross")?;
        self.total_deductions = checked_total(lines.iter().map(PayrollLine::total_deductions), "total deductions")?;
        self.total_net = checked_total(lines.iter().map(|l| Some(l.net)), "total net")?;
        self.lines = lines;
        Ok(())
    }

    pub fn approve(&mut self, approver: Option<Uuid>) -> Result<(), DomainError> {
        if self.status != PayrollStatus::Draft {
            return Err(DomainError::InvalidState(format!(
                "only draft payroll runs can be approved (current: {})",
                self.status.as_str()
            )));
        }
        let now = Utc::now();
        self.status = PayrollStatus::Approved;
        self.approved_by = approver;
        self.approved_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_paid(&mut self) -> Result<(), DomainError> {
        if self.status != PayrollStatus::Approved {
            return Err(DomainError::InvalidState(format!(
                "only approved payroll runs can be paid (current: {})",
                self.status.as_str()
            )));
        }
        let now = Utc::now();
        self.status = PayrollStatus::Paid;
        self.paid_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn soft_delete(&mut self) -> Result<(), DomainError> {
        if self.status != PayrollStatus::Draft {
            return Err(DomainError::InvalidState(
                "only draft payroll runs can be deleted".to_string(),
            ));
        }
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: PayrollRates = PayrollRates {
        pension_rate: 0.10,
        health_rate: 0.07,
    };

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn input(base: i64, bonus: i64, unpaid: u32) -> LineInput {
        LineInput {
            staff_id: Uuid::new_v4(),
            staff_name: "Ana".to_string(),
            base_salary: base,
            bonus,
            unpaid_leave_days: unpaid,
        }
    }

    #[test]
    fn test_compute_line() {
        let line = compute_line(Uuid::new_v4(), &input(900_000, 100_000, 0), RATES).unwrap();
        assert_eq!(line.gross, 1_000_000);
        assert_eq!(line.pension, 100_000);
        assert_eq!(line.health, 70_000);
        assert_eq!(line.unpaid_leave_deduction, 0);
        assert_eq!(line.net, 830_000);
    }

    #[test]
    fn test_unpaid_leave_deduction_rounds() {
        // 500_000 / 30 * 2 = 33_333.33
        let line = compute_line(Uuid::new_v4(), &input(500_000, 0, 2), RATES).unwrap();
        assert_eq!(line.unpaid_leave_deduction, 33_333);
        assert_eq!(line.net, 500_000 - 50_000 - 35_000 - 33_333);
    }

    #[test]
    fn test_net_floored_at_zero() {
        let line = compute_line(Uuid::new_v4(), &input(300_000, 0, 40), RATES).unwrap();
        assert_eq!(line.net, 0);
    }

    #[test]
    fn test_oversized_bonus_is_rejected_not_wrapped() {
        let err = compute_line(Uuid::new_v4(), &input(900_000, i64::MAX, 0), RATES).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_run_totals_overflow_is_rejected() {
        let mut run = PayrollRun::new(Uuid::new_v4(), d("2024-03-01"), d("2024-03-31")).unwrap();
        let big = i64::MAX / 2 + 1;
        let lines = vec![
            compute_line(run.id, &input(big, 0, 0), RATES).unwrap(),
            compute_line(run.id, &input(big, 0, 0), RATES).unwrap(),
        ];
        assert!(matches!(run.set_lines(lines), Err(DomainError::Validation(_))));
        assert_eq!(run.total_gross, 0);
    }

    #[test]
    fn test_totals_and_transitions() {
        let mut run = PayrollRun::new(Uuid::new_v4(), d("2024-03-01"), d("2024-03-31")).unwrap();
        let lines = vec![
            compute_line(run.id, &input(900_000, 100_000, 0), RATES).unwrap(),
            compute_line(run.id, &input(500_000, 0, 0), RATES).unwrap(),
        ];
        run.set_lines(lines).unwrap();
        assert_eq!(run.total_gross, 1_500_000);
        assert_eq!(run.total_deductions, 255_000);
        assert_eq!(run.total_net, 1_245_000);

        assert!(run.mark_paid().is_err());
        run.approve(None).unwrap();
        assert!(run.soft_delete().is_err());
        run.mark_paid().unwrap();
        assert_eq!(run.status, PayrollStatus::Paid);
    }

    #[test]
    fn test_inverted_period_rejected() {
        assert!(PayrollRun::new(Uuid::new_v4(), d("2024-03-31"), d("2024-03-01")).is_err());
    }
}
