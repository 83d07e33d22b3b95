// ============================================================================
// BizDesk Core - PTO Service
// File: crates/bizdesk-core/src/services/pto_service.rs
// ============================================================================
//! Time-off requests: filing, review, cancellation and balance keeping.

use std::sync::Arc;

use bizdesk_shared::{Page, Pagination};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::TenantContext;
use crate::domain::notification::{EVENT_PTO_REQUESTED, EVENT_PTO_REVIEWED};
use crate::domain::{PtoKind, PtoRequest, PtoStatus, ReviewAction};
use crate::error::DomainError;
use crate::gateways::{DomainEvent, EventPublisher};
use crate::repositories::{PtoFilter, PtoRepository, StaffRepository};

#[derive(Debug, Clone)]
pub struct NewPtoRequest {
    /// Required for the service actor; staff may only name themselves.
    pub staff_id: Option<Uuid>,
    pub kind: PtoKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

pub struct PtoService {
    requests: Arc<dyn PtoRepository>,
    staff: Arc<dyn StaffRepository>,
    events: Arc<dyn EventPublisher>,
}

impl PtoService {
    pub fn new(
        requests: Arc<dyn PtoRepository>,
        staff: Arc<dyn StaffRepository>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            requests,
            staff,
            events,
        }
    }

    /// Reviewers see everyone's requests; other staff only their own.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: PtoFilter,
        pagination: Pagination,
    ) -> Result<Page<PtoRequest>, DomainError> {
        let filter = if ctx.require_reviewer().is_ok() {
            filter
        } else {
            PtoFilter {
                staff_id: Some(ctx.require_staff()?),
                ..filter
            }
        };
        self.requests.list(&ctx.tenant_id, &filter, pagination).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: &Uuid) -> Result<PtoRequest, DomainError> {
        let request = self
            .requests
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("PTO request"))?;
        if ctx.require_reviewer().is_err() && ctx.staff_id() != Some(request.staff_id) {
            return Err(DomainError::not_found("PTO request"));
        }
        Ok(request)
    }

    pub async fn create(&self, ctx: &TenantContext, input: NewPtoRequest) -> Result<PtoRequest, DomainError> {
        // Staff file for themselves; only the service actor names another staff member.
        let staff_id = match (ctx.staff_id(), input.staff_id) {
            (Some(me), Some(target)) if target != me => {
                return Err(DomainError::Forbidden(
                    "staff may only request time off for themselves".to_string(),
                ));
            }
            (Some(me), _) => me,
            (None, Some(target)) => target,
            (None, None) => {
                return Err(DomainError::Validation("staff_id is required".to_string()));
            }
        };

        let staff = self
            .staff
            .find_by_id(&ctx.tenant_id, &staff_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Staff"))?;

        let request = PtoRequest::new(
            ctx.tenant_id,
            staff_id,
            input.kind,
            input.start_date,
            input.end_date,
            input.reason,
        )?;

        let clashing = self
            .requests
            .find_live_overlapping(&ctx.tenant_id, &staff_id, request.start_date, request.end_date)
            .await?;
        if !clashing.is_empty() {
            return Err(DomainError::Conflict(
                "the dates overlap another pending or approved request".to_string(),
            ));
        }

        if request.kind.uses_balance() && request.days > staff.pto_balance_days {
            return Err(DomainError::Validation(format!(
                "request needs {} day(s) but only {} remain",
                request.days, staff.pto_balance_days
            )));
        }

        let created = self.requests.create(&request).await?;
        info!(tenant_id = %ctx.tenant_id, pto_id = %created.id, days = created.days, "PTO requested");

        self.events
            .publish(DomainEvent::new(
                ctx.tenant_id,
                EVENT_PTO_REQUESTED,
                Some(staff_id),
                json!({
                    "request_id": created.id,
                    "staff_name": staff.full_name,
                    "kind": created.kind.as_str(),
                    "start_date": created.start_date,
                    "end_date": created.end_date,
                    "days": created.days,
                }),
            ))
            .await;
        Ok(created)
    }

    pub async fn review(
        &self,
        ctx: &TenantContext,
        id: &Uuid,
        action: ReviewAction,
        note: Option<String>,
    ) -> Result<PtoRequest, DomainError> {
        ctx.require_reviewer()?;
        let mut request = self.get(ctx, id).await?;
        if ctx.staff_id() == Some(request.staff_id) {
            return Err(DomainError::Forbidden("you cannot review your own request".to_string()));
        }

        request.review(action, ctx.staff_id(), note)?;

        let delta = if request.status == PtoStatus::Approved && request.kind.uses_balance() {
            let staff = self
                .staff
                .find_by_id(&ctx.tenant_id, &request.staff_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Staff"))?;
            if request.days > staff.pto_balance_days {
                warn!(pto_id = %id, "Approval refused: balance no longer covers the request");
                return Err(DomainError::InvalidState(
                    "the staff member's balance no longer covers this request".to_string(),
                ));
            }
            -request.days
        } else {
            0.0
        };

        let saved = self
            .requests
            .save_with_balance(&request, PtoStatus::Pending, delta)
            .await?;
        info!(tenant_id = %ctx.tenant_id, pto_id = %id, status = saved.status.as_str(), "PTO reviewed");

        self.events
            .publish(DomainEvent::new(
                ctx.tenant_id,
                EVENT_PTO_REVIEWED,
                Some(saved.staff_id),
                json!({
                    "request_id": saved.id,
                    "status": saved.status.as_str(),
                    "kind": saved.kind.as_str(),
                    "start_date": saved.start_date,
                    "end_date": saved.end_date,
                    "note": saved.review_note,
                }),
            ))
            .await;
        Ok(saved)
    }

    /// The requester, or a reviewer, withdraws the request.
    pub async fn cancel(&self, ctx: &TenantContext, id: &Uuid) -> Result<PtoRequest, DomainError> {
        let mut request = self.get(ctx, id).await?;
        if ctx.staff_id() != Some(request.staff_id) {
            ctx.require_reviewer()?;
        }
        let prior = request.status;
        request.cancel(Utc::now().date_naive())?;

        let delta = if prior == PtoStatus::Approved && request.kind.uses_balance() {
            request.days
        } else {
            0.0
        };
        let saved = self.requests.save_with_balance(&request, prior, delta).await?;
        info!(tenant_id = %ctx.tenant_id, pto_id = %id, "PTO cancelled");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, Staff};
    use crate::gateways::MockEventPublisher;
    use crate::repositories::{MockPtoRepository, MockStaffRepository};
    use chrono::Duration;
    use std::sync::Mutex;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn staff_with_balance(tenant: Uuid, balance: f32) -> Staff {
        let role = Role::new(tenant, "employee".into(), None, vec![]).unwrap();
        let mut s = Staff::new(tenant, "luis@pansur.cl".into(), "Luis Pérez".into(), &role);
        s.pto_balance_days = balance;
        s
    }

    fn vacation(staff_id: Option<Uuid>) -> NewPtoRequest {
        NewPtoRequest {
            staff_id,
            kind: PtoKind::Vacation,
            // Monday to Friday.
            start_date: d("2024-03-04"),
            end_date: d("2024-03-08"),
            reason: None,
        }
    }

    #[tokio::test]
    async fn test_vacation_must_fit_balance() {
        let tenant = Uuid::new_v4();
        let member = staff_with_balance(tenant, 3.0);
        let ctx = TenantContext::staff(tenant, member.id, "employee");

        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(move |_, _| Ok(Some(member.clone())));
        let mut requests = MockPtoRepository::new();
        requests.expect_find_live_overlapping().returning(|_, _, _, _| Ok(vec![]));
        requests.expect_create().never();

        let svc = PtoService::new(Arc::new(requests), Arc::new(staff), Arc::new(MockEventPublisher::new()));
        let err = svc.create(&ctx, vacation(None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_overlap_conflicts() {
        let tenant = Uuid::new_v4();
        let member = staff_with_balance(tenant, 15.0);
        let member_id = member.id;
        let ctx = TenantContext::staff(tenant, member_id, "employee");
        let existing =
            PtoRequest::new(tenant, member_id, PtoKind::Personal, d("2024-03-08"), d("2024-03-11"), None).unwrap();

        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(move |_, _| Ok(Some(member.clone())));
        let mut requests = MockPtoRepository::new();
        requests
            .expect_find_live_overlapping()
            .returning(move |_, _, _, _| Ok(vec![existing.clone()]));

        let svc = PtoService::new(Arc::new(requests), Arc::new(staff), Arc::new(MockEventPublisher::new()));
        let err = svc.create(&ctx, vacation(None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_employee_cannot_request_for_someone_else() {
        let tenant = Uuid::new_v4();
        let ctx = TenantContext::staff(tenant, Uuid::new_v4(), "employee");
        let svc = PtoService::new(
            Arc::new(MockPtoRepository::new()),
            Arc::new(MockStaffRepository::new()),
            Arc::new(MockEventPublisher::new()),
        );
        let err = svc.create(&ctx, vacation(Some(Uuid::new_v4()))).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_publishes_requested() {
        let tenant = Uuid::new_v4();
        let member = staff_with_balance(tenant, 10.0);
        let ctx = TenantContext::staff(tenant, member.id, "employee");

        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(move |_, _| Ok(Some(member.clone())));
        let mut requests = MockPtoRepository::new();
        requests.expect_find_live_overlapping().returning(|_, _, _, _| Ok(vec![]));
        requests.expect_create().returning(|r| Ok(r.clone()));
        let mut events = MockEventPublisher::new();
        events
            .expect_publish()
            .withf(|e| e.event_type == "pto.requested")
            .times(1)
            .returning(|_| ());

        let svc = PtoService::new(Arc::new(requests), Arc::new(staff), Arc::new(events));
        let created = svc.create(&ctx, vacation(None)).await.unwrap();
        assert_eq!(created.days, 5.0);
        assert_eq!(created.status, PtoStatus::Pending);
    }

    #[tokio::test]
    async fn test_approving_vacation_deducts_balance() {
        let tenant = Uuid::new_v4();
        let member = staff_with_balance(tenant, 10.0);
        let request = PtoRequest::new(tenant, member.id, PtoKind::Vacation, d("2024-03-04"), d("2024-03-06"), None).unwrap();
        let id = request.id;
        let manager = TenantContext::staff(tenant, Uuid::new_v4(), "manager");

        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(move |_, _| Ok(Some(member.clone())));
        let mut requests = MockPtoRepository::new();
        requests.expect_find_by_id().returning(move |_, _| Ok(Some(request.clone())));
        requests
            .expect_save_with_balance()
            .withf(|r, expected, delta| {
                r.status == PtoStatus::Approved && *expected == PtoStatus::Pending && *delta == -3.0
            })
            .times(1)
            .returning(|r, _, _| Ok(r.clone()));
        let mut events = MockEventPublisher::new();
        events.expect_publish().returning(|_| ());

        let svc = PtoService::new(Arc::new(requests), Arc::new(staff), Arc::new(events));
        let saved = svc.review(&manager, &id, ReviewAction::Approve, Some("ok".into())).await.unwrap();
        assert_eq!(saved.reviewer_id, manager.staff_id());
    }

    #[tokio::test]
    async fn test_manager_cannot_file_for_someone_else() {
        let tenant = Uuid::new_v4();
        let ctx = TenantContext::staff(tenant, Uuid::new_v4(), "manager");
        let mut requests = MockPtoRepository::new();
        requests.expect_create().never();
        let svc = PtoService::new(
            Arc::new(requests),
            Arc::new(MockStaffRepository::new()),
            Arc::new(MockEventPublisher::new()),
        );
        let err = svc.create(&ctx, vacation(Some(Uuid::new_v4()))).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_service_actor_files_for_named_staff() {
        let tenant = Uuid::new_v4();
        let member = staff_with_balance(tenant, 10.0);
        let member_id = member.id;

        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(move |_, _| Ok(Some(member.clone())));
        let mut requests = MockPtoRepository::new();
        requests.expect_find_live_overlapping().returning(|_, _, _, _| Ok(vec![]));
        requests.expect_create().returning(|r| Ok(r.clone()));
        let mut events = MockEventPublisher::new();
        events.expect_publish().returning(|_| ());

        let svc = PtoService::new(Arc::new(requests), Arc::new(staff), Arc::new(events));
        let created = svc
            .create(&TenantContext::service(tenant), vacation(Some(member_id)))
            .await
            .unwrap();
        assert_eq!(created.staff_id, member_id);
    }

    #[tokio::test]
    async fn test_concurrent_approvals_deduct_balance_once() {
        let tenant = Uuid::new_v4();
        let member = staff_with_balance(tenant, 10.0);
        let request = PtoRequest::new(tenant, member.id, PtoKind::Vacation, d("2024-03-04"), d("2024-03-08"), None).unwrap();
        let id = request.id;

        let status = Arc::new(Mutex::new(PtoStatus::Pending));
        let balance = Arc::new(Mutex::new(10.0f32));

        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(move |_, _| Ok(Some(member.clone())));
        let mut requests = MockPtoRepository::new();
        // Both reviewers load the request while it is still pending.
        requests.expect_find_by_id().returning(move |_, _| Ok(Some(request.clone())));
        let (st, bal) = (status.clone(), balance.clone());
        requests.expect_save_with_balance().returning(move |r, expected, delta| {
            let mut current = st.lock().unwrap();
            if *current != expected {
                return Err(DomainError::InvalidState("PTO request is no longer pending".into()));
            }
            *current = r.status;
            *bal.lock().unwrap() += delta;
            Ok(r.clone())
        });
        let mut events = MockEventPublisher::new();
        events.expect_publish().times(1).returning(|_| ());

        let svc = PtoService::new(Arc::new(requests), Arc::new(staff), Arc::new(events));
        let first = TenantContext::staff(tenant, Uuid::new_v4(), "manager");
        let second = TenantContext::staff(tenant, Uuid::new_v4(), "admin");

        svc.review(&first, &id, ReviewAction::Approve, None).await.unwrap();
        let err = svc.review(&second, &id, ReviewAction::Approve, None).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(*balance.lock().unwrap(), 5.0);
    }

    #[tokio::test]
    async fn test_employee_cannot_review() {
        let svc = PtoService::new(
            Arc::new(MockPtoRepository::new()),
            Arc::new(MockStaffRepository::new()),
            Arc::new(MockEventPublisher::new()),
        );
        let ctx = TenantContext::staff(Uuid::new_v4(), Uuid::new_v4(), "employee");
        let err = svc.review(&ctx, &Uuid::new_v4(), ReviewAction::Approve, None).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_cancel_future_approved_vacation_restores_balance() {
        let tenant = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let start = Utc::now().date_naive() + Duration::days(30);
        let mut request = PtoRequest::new(tenant, owner, PtoKind::Vacation, start, start + Duration::days(6), None).unwrap();
        request.review(ReviewAction::Approve, None, None).unwrap();
        let days = request.days;
        let id = request.id;

        let mut requests = MockPtoRepository::new();
        requests.expect_find_by_id().returning(move |_, _| Ok(Some(request.clone())));
        requests
            .expect_save_with_balance()
            .withf(move |r, expected, delta| {
                r.status == PtoStatus::Cancelled && *expected == PtoStatus::Approved && *delta == days
            })
            .times(1)
            .returning(|r, _, _| Ok(r.clone()));

        let svc = PtoService::new(
            Arc::new(requests),
            Arc::new(MockStaffRepository::new()),
            Arc::new(MockEventPublisher::new()),
        );
        let ctx = TenantContext::staff(tenant, owner, "employee");
        svc.cancel(&ctx, &id).await.unwrap();
    }
}
