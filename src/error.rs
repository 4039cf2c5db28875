// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

// region:    --- Market Error
/// 매물 수명주기 처리 중 발생하는 오류
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("{entity} {id}을(를) 찾을 수 없습니다.")]
    NotFound { entity: &'static str, id: i64 },

    #[error("사용자 {user_id}은(는) 매물 {listing_id}의 소유자가 아닙니다.")]
    NotOwner { listing_id: i64, user_id: i64 },

    #[error("{hours_until_eligible}시간 후에 다시 끌어올릴 수 있습니다.")]
    Cooldown { hours_until_eligible: i64 },

    #[error("보관 처리된 매물 {0}은(는) 변경할 수 없습니다.")]
    Archived(i64),

    #[error("입력값 검증 실패: {0}")]
    Validation(String),

    #[error("권한이 없습니다: {0}")]
    Forbidden(String),

    #[error("저장소 오류: {0}")]
    Storage(#[from] sqlx::Error),
}

impl MarketError {
    pub fn listing_not_found(id: i64) -> Self {
        MarketError::NotFound {
            entity: "매물",
            id,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        MarketError::Validation(message.into())
    }

    /// 호출자가 응답에 사용할 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::NotFound { .. } => "NOT_FOUND",
            MarketError::NotOwner { .. } => "NOT_OWNER",
            MarketError::Cooldown { .. } => "COOLDOWN",
            MarketError::Archived(_) => "ARCHIVED",
            MarketError::Validation(_) => "VALIDATION",
            MarketError::Forbidden(_) => "FORBIDDEN",
            MarketError::Storage(_) => "STORAGE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
            MarketError::NotOwner { .. } | MarketError::Forbidden(_) => StatusCode::FORBIDDEN,
            MarketError::Cooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
            MarketError::Archived(_) => StatusCode::CONFLICT,
            MarketError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            MarketError::Cooldown {
                hours_until_eligible,
            } => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
                "hours_until_eligible": hours_until_eligible,
            }),
            MarketError::Storage(e) => {
                // 내부 오류 내용은 로그에만 남긴다
                error!("{:<12} --> 저장소 오류: {:?}", "Error", e);
                serde_json::json!({
                    "error": "일시적인 오류가 발생했습니다.",
                    "code": self.code(),
                })
            }
            _ => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
// endregion: --- Market Error
