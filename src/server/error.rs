//! API error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::Error;

/// API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Offending request field for validation failures.
    pub field: Option<String>,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
            field: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid authentication token".to_string(),
            field: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
            field: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
            field: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "type": match self.status {
                    StatusCode::BAD_REQUEST => "invalid_request_error",
                    StatusCode::UNAUTHORIZED => "auth_error",
                    StatusCode::NOT_FOUND => "not_found_error",
                    StatusCode::SERVICE_UNAVAILABLE => "not_ready_error",
                    _ => "server_error",
                },
                "field": self.field,
                "code": self.status.as_str()
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::Validation { field, .. } => Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
                field: Some(field.clone()),
            },
            Error::Auth => ApiError::unauthorized(),
            Error::NotFound(_) => ApiError::not_found(err.to_string()),
            Error::NotReady => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: err.to_string(),
                field: None,
            },
            // Engine exhaustion and infrastructure failures surface their
            // message for operator diagnosis; acceptable at this internal
            // trust boundary.
            _ => ApiError::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400_with_field() {
        let api: ApiError = Error::validation("title", "too short").into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.field.as_deref(), Some("title"));
    }

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        let cases: Vec<(Error, StatusCode)> = vec![
            (Error::Auth, StatusCode::UNAUTHORIZED),
            (Error::NotFound("x.wav".into()), StatusCode::NOT_FOUND),
            (Error::NotReady, StatusCode::SERVICE_UNAVAILABLE),
            (
                Error::EnginesExhausted("both tiers failed".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::Configuration("bad env".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, status);
        }
    }
}
