mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Duration;
use common::*;
use marketplace_service::handlers::{self, USER_ID_HEADER};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(h: &Harness) -> Router {
    handlers::router(h.service.clone())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, user_id: Option<i64>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header(USER_ID_HEADER, user_id.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, user_id: Option<i64>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(USER_ID_HEADER, user_id.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_create_then_fetch_listing() {
    let h = harness();
    let (status, created) = send(
        app(&h),
        post_json(
            "/listings",
            Some(SELLER),
            json!({"title": "전기 포트", "price": 15000, "category": "home"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "active");
    assert_eq!(created["bump_count"], 0);

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = send(app(&h), get(&format!("/listings/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "전기 포트");
    assert_eq!(fetched["seller_name"], "판매자");
}

#[tokio::test]
async fn test_create_requires_user_header() {
    let h = harness();
    let (status, body) = send(
        app(&h),
        post_json(
            "/listings",
            None,
            json!({"title": "전기 포트", "price": 15000, "category": "home"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_bump_cooldown_response_carries_hours() {
    let h = harness();
    let listing = create(&h, SELLER, "러닝화", 60_000, "sports").await;
    let uri = format!("/listings/{}/bump", listing.id);

    let (status, bumped) = send(app(&h), post_json(&uri, Some(SELLER), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bumped["bump_count"], 1);

    h.clock.advance(Duration::hours(23));
    let (status, body) = send(app(&h), post_json(&uri, Some(SELLER), json!({}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "COOLDOWN");
    assert_eq!(body["hours_until_eligible"], 1);

    let (status, eligibility) = send(app(&h), get(&uri, Some(SELLER))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(eligibility["allowed"], false);
    assert_eq!(eligibility["reason"], "cooldown");
    assert_eq!(eligibility["hours_until_eligible"], 1);
}

#[tokio::test]
async fn test_bump_by_non_owner_is_forbidden() {
    let h = harness();
    let listing = create(&h, SELLER, "러닝화", 60_000, "sports").await;
    let uri = format!("/listings/{}/bump", listing.id);

    let (status, body) = send(app(&h), post_json(&uri, Some(OTHER_USER), json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_OWNER");
}

#[tokio::test]
async fn test_archive_is_admin_only() {
    let h = harness();
    let listing = create(&h, SELLER, "의심 매물", 1_000, "other").await;
    let uri = format!("/admin/listings/{}/archive", listing.id);

    let (status, _) = send(
        app(&h),
        post_json(&uri, Some(SELLER), json!({"reason": "prohibited item"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, archived) = send(
        app(&h),
        post_json(&uri, Some(ADMIN), json!({"reason": "prohibited item"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["status"], "archived");

    let (status, body) = send(
        app(&h),
        post_json(
            &format!("/listings/{}/bump", listing.id),
            Some(SELLER),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ARCHIVED");
}

#[tokio::test]
async fn test_list_query_string_filters() {
    let h = harness();
    create(&h, SELLER, "소설책", 1_500, "books").await;
    create(&h, SELLER, "만화책", 500, "books").await;
    create(&h, SELLER, "백과사전", 5_000, "books").await;
    create(&h, SELLER, "장난감", 1_000, "toys").await;

    let (status, page) = send(
        app(&h),
        get(
            "/listings?category=books&priceMin=500&priceMax=2000&sortBy=price&sortOrder=asc",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let prices: Vec<i64> = page["listings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["price"].as_i64().unwrap())
        .collect();
    assert_eq!(prices, vec![500, 1_500]);
    assert_eq!(page["has_more"], false);
}

#[tokio::test]
async fn test_list_rejects_unknown_category() {
    let h = harness();
    let (status, body) = send(app(&h), get("/listings?category=weapons", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn test_list_rejects_malformed_query_as_json() {
    let h = harness();
    for uri in ["/listings?status=sold", "/listings?limit=abc"] {
        let (status, body) = send(app(&h), get(uri, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "VALIDATION", "{uri}");
    }
}

#[tokio::test]
async fn test_admin_sweep_reports_expired_count() {
    let h = harness();
    create(&h, SELLER, "오래된 매물", 1_000, "other").await;
    h.clock.advance(Duration::days(4));

    let (status, _) = send(app(&h), post_json("/admin/sweep", Some(SELLER), json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(app(&h), post_json("/admin/sweep", Some(ADMIN), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expired"], 1);
}
