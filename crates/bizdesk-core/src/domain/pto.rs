// ============================================================================
// BizDesk Core - Paid Time Off
// File: crates/bizdesk-core/src/domain/pto.rs
// Description: PTO requests and their review workflow
// ============================================================================

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PtoKind {
    Vacation,
    Sick,
    Personal,
    Unpaid,
}

impl PtoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PtoKind::Vacation => "vacation",
            PtoKind::Sick => "sick",
            PtoKind::Personal => "personal",
            PtoKind::Unpaid => "unpaid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "vacation" => Some(PtoKind::Vacation),
            "sick" => Some(PtoKind::Sick),
            "personal" => Some(PtoKind::Personal),
            "unpaid" => Some(PtoKind::Unpaid),
            _ => None,
        }
    }

    /// Only vacation draws from the staff member's balance.
    pub fn uses_balance(&self) -> bool {
        matches!(self, PtoKind::Vacation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PtoStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl PtoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PtoStatus::Pending => "pending",
            PtoStatus::Approved => "approved",
            PtoStatus::Rejected => "rejected",
            PtoStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PtoStatus::Pending),
            "approved" => Some(PtoStatus::Approved),
            "rejected" => Some(PtoStatus::Rejected),
            "cancelled" => Some(PtoStatus::Cancelled),
            _ => None,
        }
    }

    /// Pending and approved requests block the calendar.
    pub fn is_live(&self) -> bool {
        matches!(self, PtoStatus::Pending | PtoStatus::Approved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtoRequest {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub staff_id: Uuid,
    pub kind: PtoKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Business days covered, Monday to Friday.
    pub days: f32,
    pub reason: Option<String>,
    pub status: PtoStatus,
    pub reviewer_id: Option<Uuid>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PtoRequest {
    pub fn new(
        tenant_id: Uuid,
        staff_id: Uuid,
        kind: PtoKind,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<String>,
    ) -> Result<Self, DomainError> {
        if end_date < start_date {
            return Err(DomainError::Validation(
                "end_date must not be before start_date".to_string(),
            ));
        }
        let days = business_days(start_date, end_date);
        if days == 0 {
            return Err(DomainError::Validation(
                "request covers no business days".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            staff_id,
            kind,
            start_date,
            end_date,
            days: days as f32,
            reason,
            status: PtoStatus::Pending,
            reviewer_id: None,
            review_note: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        })
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    pub fn review(
        &mut self,
        action: ReviewAction,
        reviewer_id: Option<Uuid>,
        note: Option<String>,
    ) -> Result<(), DomainError> {
        if self.status != PtoStatus::Pending {
            return Err(DomainError::InvalidState(format!(
                "cannot review a {} request",
                self.status.as_str()
            )));
        }
        let now = Utc::now();
        self.status = match action {
            ReviewAction::Approve => PtoStatus::Approved,
            ReviewAction::Reject => PtoStatus::Rejected,
        };
        self.reviewer_id = reviewer_id;
        self.review_note = note;
        self.reviewed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Pending requests can always be withdrawn; approved ones only before
    /// they start.
    pub fn cancel(&mut self, today: NaiveDate) -> Result<(), DomainError> {
        match self.status {
            PtoStatus::Pending => {}
            PtoStatus::Approved if self.start_date > today => {}
            PtoStatus::Approved => {
                return Err(DomainError::InvalidState(
                    "approved time off that has started cannot be cancelled".to_string(),
                ))
            }
            other => {
                return Err(DomainError::InvalidState(format!(
                    "cannot cancel a {} request",
                    other.as_str()
                )))
            }
        }
        self.status = PtoStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Business days of this request that fall inside `[start, end]`.
    pub fn business_days_within(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        let from = self.start_date.max(start);
        let to = self.end_date.min(end);
        if to < from {
            0
        } else {
            business_days(from, to)
        }
    }
}

/// Counts Monday-Friday dates in the inclusive range.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(start: &str, end: &str) -> PtoRequest {
        PtoRequest::new(Uuid::new_v4(), Uuid::new_v4(), PtoKind::Vacation, d(start), d(end), None).unwrap()
    }

    #[test]
    fn test_business_days() {
        // 2024-03-04 is a Monday.
        assert_eq!(business_days(d("2024-03-04"), d("2024-03-08")), 5);
        assert_eq!(business_days(d("2024-03-04"), d("2024-03-10")), 5);
        assert_eq!(business_days(d("2024-03-09"), d("2024-03-10")), 0);
        assert_eq!(business_days(d("2024-03-08"), d("2024-03-11")), 2);
        assert_eq!(business_days(d("2024-03-11"), d("2024-03-08")), 0);
    }

    #[test]
    fn test_weekend_only_request_rejected() {
        let res = PtoRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            PtoKind::Personal,
            d("2024-03-09"),
            d("2024-03-10"),
            None,
        );
        assert!(matches!(res, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let res = PtoRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            PtoKind::Sick,
            d("2024-03-10"),
            d("2024-03-04"),
            None,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_review_only_from_pending() {
        let mut r = request("2024-03-04", "2024-03-05");
        r.review(ReviewAction::Approve, Some(Uuid::new_v4()), None).unwrap();
        assert_eq!(r.status, PtoStatus::Approved);
        assert!(r.reviewed_at.is_some());
        assert!(r.review(ReviewAction::Reject, None, None).is_err());
    }

    #[test]
    fn test_cancel_rules() {
        let mut pending = request("2024-03-04", "2024-03-05");
        assert!(pending.cancel(d("2024-03-20")).is_ok());

        let mut future = request("2024-03-04", "2024-03-05");
        future.review(ReviewAction::Approve, None, None).unwrap();
        assert!(future.cancel(d("2024-03-01")).is_ok());
        assert_eq!(future.status, PtoStatus::Cancelled);

        let mut started = request("2024-03-04", "2024-03-05");
        started.review(ReviewAction::Approve, None, None).unwrap();
        assert!(started.cancel(d("2024-03-04")).is_err());

        let mut rejected = request("2024-03-04", "2024-03-05");
        rejected.review(ReviewAction::Reject, None, None).unwrap();
        assert!(rejected.cancel(d("2024-03-01")).is_err());
    }

    #[test]
    fn test_overlap_and_clipping() {
        let r = request("2024-03-06", "2024-03-12");
        assert!(r.overlaps(d("2024-03-12"), d("2024-03-20")));
        assert!(!r.overlaps(d("2024-03-13"), d("2024-03-20")));
        // Wed..Fri inside the first week, Mon..Tue in the second.
        assert_eq!(r.business_days_within(d("2024-03-01"), d("2024-03-08")), 3);
        assert_eq!(r.business_days_within(d("2024-03-11"), d("2024-03-31")), 2);
        assert_eq!(r.business_days_within(d("2024-04-01"), d("2024-04-30")), 0);
    }
}
