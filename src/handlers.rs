// region:    --- Imports
use crate::error::MarketError;
use crate::lifecycle::BumpRequest;
use crate::listing::NewListing;
use crate::query::{ListingFilters, Viewer};
use crate::service::MarketplaceService;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

/// 요청자 텔레그램 사용자 id 헤더 (세션 검증은 앞단 게이트웨이에서 처리)
pub const USER_ID_HEADER: &str = "x-user-id";

pub type AppState = Arc<MarketplaceService>;

// region:    --- Router
pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/listings", get(handle_list_listings).post(handle_create_listing))
        .route("/listings/:id", get(handle_get_listing))
        .route(
            "/listings/:id/bump",
            get(handle_can_bump).post(handle_bump),
        )
        .route("/listings/:id/images", post(handle_attach_image))
        .route("/admin/listings/:id/archive", post(handle_archive))
        .route("/admin/sweep", post(handle_sweep))
        .with_state(service)
}
// endregion: --- Router

// region:    --- Requester
fn requester(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn require_requester(headers: &HeaderMap) -> Result<i64, MarketError> {
    requester(headers).ok_or_else(|| MarketError::Forbidden("로그인이 필요합니다.".to_string()))
}

async fn require_admin(
    service: &MarketplaceService,
    headers: &HeaderMap,
) -> Result<i64, MarketError> {
    let user_id = require_requester(headers)?;
    match service.viewer_for(Some(user_id)).await? {
        Viewer::Admin => Ok(user_id),
        Viewer::Public => Err(MarketError::Forbidden(
            "관리자 권한이 필요합니다.".to_string(),
        )),
    }
}
// endregion: --- Requester

// region:    --- Command Handlers

/// 매물 등록
pub async fn handle_create_listing(
    State(service): State<AppState>,
    headers: HeaderMap,
    Json(new_listing): Json<NewListing>,
) -> Result<impl IntoResponse, MarketError> {
    let user_id = require_requester(&headers)?;
    info!("{:<12} --> 매물 등록 요청 사용자: {}", "Handler", user_id);
    let listing = service.create(user_id, new_listing).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// 무료 끌어올리기 (유료는 결제 이벤트로만 처리)
pub async fn handle_bump(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<i64>,
) -> Result<impl IntoResponse, MarketError> {
    let user_id = require_requester(&headers)?;
    info!(
        "{:<12} --> 끌어올리기 요청 id: {}, 사용자: {}",
        "Handler", listing_id, user_id
    );
    let listing = service.bump(BumpRequest::free(listing_id, user_id)).await?;
    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
pub struct AttachImageRequest {
    pub storage_key: String,
}

/// 이미지 등록 (업로드 자체는 오브젝트 스토리지에서 끝난 상태)
pub async fn handle_attach_image(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<i64>,
    Json(request): Json<AttachImageRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let user_id = require_requester(&headers)?;
    let image = service
        .attach_image(listing_id, user_id, &request.storage_key)
        .await?;
    Ok((StatusCode::CREATED, Json(image)))
}

#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    pub reason: String,
}

/// 매물 보관 (관리자)
pub async fn handle_archive(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<i64>,
    Json(request): Json<ArchiveRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let admin_id = require_admin(&service, &headers).await?;
    info!(
        "{:<12} --> 보관 요청 id: {}, 관리자: {}",
        "Handler", listing_id, admin_id
    );
    let listing = service.archive(listing_id, &request.reason).await?;
    Ok(Json(listing))
}

/// 만료 처리 수동 실행 (관리자)
pub async fn handle_sweep(
    State(service): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, MarketError> {
    require_admin(&service, &headers).await?;
    let expired = service.sweep_expired().await?;
    Ok(Json(serde_json::json!({ "expired": expired })))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 매물 목록 조회
pub async fn handle_list_listings(
    State(service): State<AppState>,
    headers: HeaderMap,
    filters: Result<Query<ListingFilters>, QueryRejection>,
) -> Result<impl IntoResponse, MarketError> {
    // 잘못된 쿼리 문자열도 JSON 검증 오류로 응답
    let Query(filters) =
        filters.map_err(|rejection| MarketError::validation(rejection.body_text()))?;
    let viewer = service.viewer_for(requester(&headers)).await?;
    let page = service.list(filters, viewer).await?;
    Ok(Json(page))
}

/// 매물 조회
pub async fn handle_get_listing(
    State(service): State<AppState>,
    Path(listing_id): Path<i64>,
) -> Result<impl IntoResponse, MarketError> {
    info!("{:<12} --> 매물 조회 id: {}", "HandlerQuery", listing_id);
    let view = service.get(listing_id).await?;
    Ok(Json(view))
}

/// 끌어올리기 가능 여부 조회
pub async fn handle_can_bump(
    State(service): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<i64>,
) -> Result<impl IntoResponse, MarketError> {
    let user_id = require_requester(&headers)?;
    let eligibility = service.can_bump(listing_id, user_id).await?;
    Ok(Json(eligibility))
}

// endregion: --- Query Handlers
