mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use uuid::Uuid;

use bizdesk_core::domain::Product;
use bizdesk_security::PasswordService;
use bizdesk_shared::Page;

use common::{bearer, json, json_body, send, staff, tenant, Mocks, SERVICE_KEY};

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

// ---------------------------------------------------------------- health

#[tokio::test]
async fn test_health_is_public() {
    let app = Mocks::default().into_router();
    let response = send(app, get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = Mocks::default().into_router();
    let response = send(app, get("/health/ready").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["database"], "down");
}

// -------------------------------------------------------- tenant context

#[tokio::test]
async fn test_missing_credentials_is_unauthorized() {
    let app = Mocks::default().into_router();
    let response = send(app, get("/api/products").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_malformed_tenant_header_is_bad_request() {
    let app = Mocks::default().into_router();
    let request = get("/api/products")
        .header("x-api-key", SERVICE_KEY)
        .header("x-tenant-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_service_key_is_unauthorized() {
    let app = Mocks::default().into_router();
    let request = get("/api/products")
        .header("x-api-key", "guessed")
        .header("x-tenant-id", Uuid::new_v4().to_string())
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_service_key_without_tenant_is_bad_request() {
    let app = Mocks::default().into_router();
    let request = get("/api/products")
        .header("x-api-key", SERVICE_KEY)
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tenant_header_must_match_token() {
    let t = tenant();
    let app = Mocks::default().into_router();
    let request = get("/api/products")
        .header("authorization", bearer(Uuid::new_v4(), t.id, "admin"))
        .header("x-tenant-id", Uuid::new_v4().to_string())
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = Mocks::default().into_router();
    let request = get("/api/products")
        .header("authorization", "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inactive_tenant_is_forbidden() {
    let mut t = tenant();
    t.is_active = false;
    let app = Mocks::default().with_tenant(&t).into_router();
    let request = get("/api/products")
        .header("authorization", bearer(Uuid::new_v4(), t.id, "admin"))
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_tenant_is_forbidden() {
    let t = tenant();
    let app = Mocks::default().with_tenant(&t).into_router();
    let request = get("/api/products")
        .header("x-api-key", SERVICE_KEY)
        .header("x-tenant-id", Uuid::new_v4().to_string())
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// -------------------------------------------------------------- auth

#[tokio::test]
async fn test_login_issues_token_and_hides_hash() {
    let t = tenant();
    let mut member = staff(t.id, "camila@losandes.cl", "admin");
    member.password_hash = Some(PasswordService::hash("correct-horse-battery").unwrap());

    let mut mocks = Mocks::default();
    let found = t.clone();
    mocks
        .tenants
        .expect_find_by_slug()
        .withf(|slug| slug == "los-andes")
        .returning(move |_| Ok(Some(found.clone())));
    let stored = member.clone();
    mocks
        .staff
        .expect_find_by_email()
        .returning(move |_, _| Ok(Some(stored.clone())));

    let request = json(
        "POST",
        "/api/auth/login",
        json!({"tenant_slug": "Los-Andes", "email": "Camila@LosAndes.cl", "password": "correct-horse-battery"}),
    );
    let response = send(mocks.into_router(), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(body["data"]["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["data"]["staff"].get("password_hash").is_none());
    assert_eq!(body["data"]["tenant"]["slug"], "los-andes");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let t = tenant();
    let mut member = staff(t.id, "camila@losandes.cl", "admin");
    member.password_hash = Some(PasswordService::hash("correct-horse-battery").unwrap());

    let mut mocks = Mocks::default();
    let found = t.clone();
    mocks
        .tenants
        .expect_find_by_slug()
        .returning(move |_| Ok(Some(found.clone())));
    mocks
        .staff
        .expect_find_by_email()
        .returning(move |_, _| Ok(Some(member.clone())));

    let request = json(
        "POST",
        "/api/auth/login",
        json!({"tenant_slug": "los-andes", "email": "camila@losandes.cl", "password": "wrong-password"}),
    );
    let response = send(mocks.into_router(), request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let request = json(
        "POST",
        "/api/tenants",
        json!({
            "name": "Panadería Sur",
            "slug": "panaderia-sur",
            "owner_email": "owner@sur.cl",
            "owner_name": "Owner",
            "password": "short"
        }),
    );
    let response = send(Mocks::default().into_router(), request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ----------------------------------------------------------- products

#[tokio::test]
async fn test_service_actor_lists_products() {
    let t = tenant();
    let mut mocks = Mocks::default().with_tenant(&t);
    let tenant_id = t.id;
    mocks
        .products
        .expect_list()
        .withf(move |tid, filter, p| *tid == tenant_id && filter.category.as_deref() == Some("tools") && p.page == 2)
        .returning(move |tid, _, p| Ok(Page::new(vec![Product::new(*tid, "Martillo".to_string())], p, 21)));

    let request = get("/api/products?category=tools&page=2&per_page=20")
        .header("x-api-key", SERVICE_KEY)
        .header("x-tenant-id", t.id.to_string())
        .body(Body::empty())
        .unwrap();
    let response = send(mocks.into_router(), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["total"], 21);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["items"][0]["name"], "Martillo");
}

#[tokio::test]
async fn test_product_not_found() {
    let t = tenant();
    let mut mocks = Mocks::default().with_tenant(&t);
    mocks.products.expect_find_by_id().returning(|_, _| Ok(None));

    let request = get(&format!("/api/products/{}", Uuid::new_v4()))
        .header("authorization", bearer(Uuid::new_v4(), t.id, "employee"))
        .body(Body::empty())
        .unwrap();
    let response = send(mocks.into_router(), request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_bad_path_id_is_bad_request() {
    let t = tenant();
    let app = Mocks::default().with_tenant(&t).into_router();
    let request = get("/api/products/123")
        .header("authorization", bearer(Uuid::new_v4(), t.id, "admin"))
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_product_returns_created() {
    let t = tenant();
    let mut mocks = Mocks::default().with_tenant(&t);
    mocks.products.expect_create().returning(|p| Ok(p.clone()));

    let mut request = json(
        "POST",
        "/api/products",
        json!({"name": "Taladro percutor", "price": 59990, "tags": ["Tools", "tools"]}),
    );
    request
        .headers_mut()
        .insert("authorization", bearer(Uuid::new_v4(), t.id, "admin").parse().unwrap());
    let response = send(mocks.into_router(), request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["name"], "Taladro percutor");
    assert_eq!(body["data"]["price"], 59990);
    assert_eq!(body["data"]["tenant_id"], t.id.to_string());
}

#[tokio::test]
async fn test_create_product_without_name_is_validation_error() {
    let t = tenant();
    let app = Mocks::default().with_tenant(&t).into_router();

    let mut request = json("POST", "/api/products", json!({"price": 1000}));
    request
        .headers_mut()
        .insert("authorization", bearer(Uuid::new_v4(), t.id, "admin").parse().unwrap());
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let t = tenant();
    let app = Mocks::default().with_tenant(&t).into_router();

    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header("content-type", "application/json")
        .header("authorization", bearer(Uuid::new_v4(), t.id, "admin"))
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_delete_product_envelope() {
    let t = tenant();
    let mut mocks = Mocks::default().with_tenant(&t);
    mocks
        .products
        .expect_find_by_id()
        .returning(|tid, _| Ok(Some(Product::new(*tid, "Sierra".to_string()))));
    mocks.products.expect_soft_delete().times(1).returning(|_, _| Ok(()));

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/products/{}", Uuid::new_v4()))
        .header("authorization", bearer(Uuid::new_v4(), t.id, "admin"))
        .body(Body::empty())
        .unwrap();
    let response = send(mocks.into_router(), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["deleted"], true);
}

#[tokio::test]
async fn test_enrich_rejects_unknown_method() {
    let t = tenant();
    let app = Mocks::default().with_tenant(&t).into_router();

    let mut request = json(
        "POST",
        &format!("/api/products/{}/enrich", Uuid::new_v4()),
        json!({"methods": ["crystal-ball"]}),
    );
    request
        .headers_mut()
        .insert("authorization", bearer(Uuid::new_v4(), t.id, "admin").parse().unwrap());
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ------------------------------------------------------------ role gates

#[tokio::test]
async fn test_employee_cannot_create_payroll() {
    let t = tenant();
    let app = Mocks::default().with_tenant(&t).into_router();

    let mut request = json(
        "POST",
        "/api/payroll",
        json!({"period_start": "2026-09-01", "period_end": "2026-09-30"}),
    );
    request
        .headers_mut()
        .insert("authorization", bearer(Uuid::new_v4(), t.id, "employee").parse().unwrap());
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_service_actor_has_no_inbox() {
    let t = tenant();
    let app = Mocks::default().with_tenant(&t).into_router();

    let request = get("/api/notifications")
        .header("x-api-key", SERVICE_KEY)
        .header("x-tenant-id", t.id.to_string())
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_mark_all_read_counts() {
    let t = tenant();
    let me = Uuid::new_v4();
    let mut mocks = Mocks::default().with_tenant(&t);
    mocks
        .notifications
        .expect_mark_all_read()
        .withf(move |_, staff_id| *staff_id == me)
        .returning(|_, _| Ok(3));

    let request = Request::builder()
        .method("POST")
        .uri("/api/notifications/read-all")
        .header("authorization", bearer(me, t.id, "employee"))
        .body(Body::empty())
        .unwrap();
    let response = send(mocks.into_router(), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["updated"], 3);
}
