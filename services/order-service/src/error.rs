use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orchestration::OrderError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

/// Error returned by every order handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Invalid ID")]
    InvalidId,

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Order(e) => match e {
                OrderError::Validation(_) | OrderError::InsufficientInventory => {
                    StatusCode::BAD_REQUEST
                }
                OrderError::InventoryService(_) => StatusCode::SERVICE_UNAVAILABLE,
                OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderError::Persistence(_)
                | OrderError::BatchTimeout
                | OrderError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidId | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = match &self {
            ApiError::Order(e) => Some(e.kind()),
            _ => None,
        };

        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
                kind,
            }),
        )
            .into_response()
    }
}

/// Parse an order id path segment
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OrderError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (OrderError::InsufficientInventory, StatusCode::BAD_REQUEST),
            (OrderError::InventoryService("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (OrderError::NotFound(1), StatusCode::NOT_FOUND),
            (OrderError::Persistence("db".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (OrderError::Pipeline("panicked".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(ApiError::InvalidId)));
    }
}
