use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use backend::BackendError;
use records::ApiEnvelope;
use serde_json::Value;

/// A failed proxy call, rendered as `{success: false, message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

/// Backend auth failures become 401, client mistakes 400, everything else 500.
pub fn status_for(err: &BackendError) -> StatusCode {
    match err {
        BackendError::Validation(_) => StatusCode::BAD_REQUEST,
        other => match other.status() {
            Some(401) | Some(403) => StatusCode::UNAUTHORIZED,
            Some(400) | Some(404) | Some(422) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        Self::new(status_for(&err), err.user_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiEnvelope::<Value>::failure(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> BackendError {
        BackendError::Rejected {
            status,
            message: "nope".into(),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&rejected(401)), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&rejected(403)), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&rejected(422)), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&rejected(404)), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&rejected(503)), StatusCode::INTERNAL_SERVER_ERROR);
        // success: false on a 200
        assert_eq!(status_for(&rejected(200)), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_for(&BackendError::Decode("bad".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_is_backend_detail() {
        let err = ApiError::from(rejected(400));
        assert_eq!(err.message, "nope");
    }
}
