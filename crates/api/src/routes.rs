use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, Request, StatusCode, header::AUTHORIZATION},
    routing::{get, patch, post},
};
use backend::{BackendClient, BackendError};
use records::{ApiEnvelope, DeleteRequest, DocumentFlag};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};

type ApiResult = Result<Json<ApiEnvelope<Value>>, ApiError>;

pub struct AppState {
    backend: BackendClient,
    metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            metrics: Metrics::new(),
        }
    }

    /// Client carrying the caller's bearer token, or the configured one.
    fn authorize(&self, headers: &HeaderMap) -> Result<BackendClient, ApiError> {
        if let Some(token) = bearer_token(headers) {
            return Ok(self.backend.with_token(token));
        }
        if self.backend.token().is_some() {
            return Ok(self.backend.clone());
        }
        self.metrics.record_unauthorized();
        Err(ApiError::unauthorized())
    }

    fn invalid(&self, message: impl Into<String>) -> ApiError {
        self.metrics.record_invalid();
        ApiError::bad_request(message)
    }

    async fn forward<F>(&self, route: &'static str, call: F) -> Result<Value, ApiError>
    where
        F: Future<Output = Result<Value, BackendError>>,
    {
        let timer = TimedOperation::start();
        let result = call.await;
        self.metrics.record_forward(result.is_ok(), timer.elapsed());
        result.map_err(|e| {
            error!(route, error = %e, "backend call failed");
            ApiError::from(e)
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/collections", get(list_collections))
        .route("/api/collections/:id", patch(update_collection))
        .route(
            "/api/collections/:id/documents",
            get(list_documents).delete(delete_documents),
        )
        .route("/api/collections/:id/document-groups", get(list_document_groups))
        .route(
            "/api/collections/:id/documents/:document_id/verification",
            patch(set_verified),
        )
        .route(
            "/api/collections/:id/documents/:document_id/vulnerable",
            patch(set_vulnerable),
        )
        .route("/api/auth/logout", post(logout))
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "proxy",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %Uuid::new_v4(),
            )
        }))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    limit: Option<String>,
    offset: Option<String>,
}

impl PageQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        [("limit", &self.limit), ("offset", &self.offset)]
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_ref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, v.clone()))
            })
            .collect()
    }
}

async fn list_collections(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult {
    let client = state.authorize(&headers)?;
    let data = state
        .forward("collections", client.request(reqwest::Method::GET, &["collections"], &[], None))
        .await?;
    Ok(Json(ApiEnvelope::ok(data)))
}

async fn update_collection(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let client = state.authorize(&headers)?;
    let Ok(Json(body)) = body else {
        return Err(state.invalid("Invalid collection payload"));
    };
    let data = state
        .forward(
            "update_collection",
            client.request(
                reqwest::Method::PATCH,
                &["collections", id.as_str()],
                &[],
                Some(&body),
            ),
        )
        .await?;
    Ok(Json(ApiEnvelope::ok(data)))
}

async fn list_documents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult {
    let client = state.authorize(&headers)?;
    let query = page.pairs();
    let data = state
        .forward(
            "documents",
            client.request(
                reqwest::Method::GET,
                &["collections", id.as_str(), "documents"],
                &query,
                None,
            ),
        )
        .await?;
    Ok(Json(ApiEnvelope::ok(data)))
}

async fn list_document_groups(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> ApiResult {
    let client = state.authorize(&headers)?;
    let query = page.pairs();
    let segments = ["collections", id.as_str(), "document-groups"];
    let data = state
        .forward(
            "document_groups",
            client.request(reqwest::Method::GET, &segments, &query, None),
        )
        .await?;
    Ok(Json(ApiEnvelope::ok(data)))
}

async fn delete_documents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let client = state.authorize(&headers)?;
    let request = body
        .ok()
        .and_then(|Json(body)| serde_json::from_value::<DeleteRequest>(body).ok())
        .filter(|request| !request.ids().is_empty())
        .ok_or_else(|| state.invalid("Either file_ids or document_ids must be provided"))?;

    let data = state
        .forward("delete_documents", client.delete_documents(&id, &request))
        .await?;
    Ok(Json(ApiEnvelope::ok(data)))
}

async fn set_verified(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, document_id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    set_flag(&state, &headers, &id, &document_id, body, DocumentFlag::Verified).await
}

async fn set_vulnerable(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, document_id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    set_flag(&state, &headers, &id, &document_id, body, DocumentFlag::Vulnerable).await
}

async fn set_flag(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    document_id: &str,
    body: Result<Json<Value>, JsonRejection>,
    flag: DocumentFlag,
) -> ApiResult {
    let client = state.authorize(headers)?;
    let value = body
        .ok()
        .and_then(|Json(body)| body.get(flag.field()).and_then(Value::as_bool))
        .ok_or_else(|| state.invalid(format!("Invalid {} value", flag.field())))?;

    let data = state
        .forward("set_flag", client.set_flag(id, document_id, flag, value))
        .await?;
    Ok(Json(ApiEnvelope::ok(data)))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<ApiEnvelope<Value>>), ApiError> {
    let client = state.authorize(&headers)?;
    state.forward("logout", client.sign_out()).await?;
    let envelope = ApiEnvelope {
        success: true,
        data: None,
        message: None,
    };
    Ok((StatusCode::CREATED, Json(envelope)))
}

// Health needs no credentials; the caller's token is passed on if present.
async fn health(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult {
    let client = match bearer_token(&headers) {
        Some(token) => state.backend.with_token(token),
        None => state.backend.clone(),
    };
    let data = state.forward("health", client.health()).await?;
    Ok(Json(ApiEnvelope::ok(data)))
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<ApiEnvelope<MetricsSnapshot>> {
    Json(ApiEnvelope::ok(state.metrics.snapshot()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use backend::BackendConfig;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(server: &MockServer, token: Option<&str>) -> Router {
        let backend = BackendClient::new(&BackendConfig {
            base_url: server.uri(),
            token: token.map(str::to_string),
            request_timeout_secs: Some(5),
        })
        .unwrap();
        router(Arc::new(AppState::new(backend)))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "Bearer user-token");
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_collections_forward_bearer_and_wrap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"uuid": "c1", "name": "Docs"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = call(app(&server, None), "GET", "/api/collections", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": [{"uuid": "c1", "name": "Docs"}]}));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_401() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let request = Request::builder()
            .uri("/api/collections")
            .body(Body::empty())
            .unwrap();
        let response = app(&server, None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_configured_token_is_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections"))
            .and(header("authorization", "Bearer service-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let request = Request::builder()
            .uri("/api/collections")
            .body(Body::empty())
            .unwrap();
        let response = app(&server, Some("service-token")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_encoded_slash_in_id_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hit": true})))
            .expect(0)
            .mount(&server)
            .await;
        let app = app(&server, Some("service-token"));

        let request = Request::builder()
            .method("PATCH")
            .uri("/api/collections/..%2Fusers%2Fadmin")
            .header("content-type", "application/json")
            .body(Body::from(json!({"role": "owner"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .uri("/api/collections/..%2Fhealth/document-groups")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) = call(
            app,
            "PATCH",
            "/api/collections/c1/documents/..%2F..%2Fauth%2Fsignout/verification",
            Some(json!({"verified": true})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_documents_pass_paging_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/c1/documents"))
            .and(query_param("limit", "3000"))
            .and(query_param("offset", "3000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = call(
            app(&server, None),
            "GET",
            "/api/collections/c1/documents?limit=3000&offset=3000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_verification_requires_boolean() {
        let server = MockServer::start().await;
        let (status, body) = call(
            app(&server, None),
            "PATCH",
            "/api/collections/c1/documents/d1/verification",
            Some(json!({"verified": "yes"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "message": "Invalid verified value"}));
    }

    #[tokio::test]
    async fn test_flags_reach_their_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/collections/c1/documents/d1"))
            .and(body_json(json!({"verified": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "d1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/collections/c1/documents/d1/vulnerable"))
            .and(body_json(json!({"vulnerable": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "d1"})))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = call(
            app(&server, None),
            "PATCH",
            "/api/collections/c1/documents/d1/verification",
            Some(json!({"verified": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], "d1");

        let (status, _) = call(
            app(&server, None),
            "PATCH",
            "/api/collections/c1/documents/d1/vulnerable",
            Some(json!({"vulnerable": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_validates_ids() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/collections/c1/documents"))
            .and(body_json(json!({"file_ids": ["f1"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let (status, _) = call(
            app(&server, None),
            "DELETE",
            "/api/collections/c1/documents",
            Some(json!({"file_ids": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            app(&server, None),
            "DELETE",
            "/api/collections/c1/documents",
            Some(json!({"file_ids": ["f1"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_backend_errors_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/collections/c1"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"detail": "name is required"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collections/c2/document-groups"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let (status, body) = call(
            app(&server, None),
            "PATCH",
            "/api/collections/c1",
            Some(json!({"name": "", "metadata": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "name is required");

        let (status, body) = call(
            app(&server, None),
            "GET",
            "/api/collections/c2/document-groups",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_logout_answers_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = call(app(&server, None), "POST", "/api/auth/logout", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_stats_count_forwards() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let app = app(&server, None);
        let (status, body) = call(app.clone(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");

        let (_, body) = call(app, "GET", "/api/stats", None).await;
        assert_eq!(body["data"]["total_requests"], 1);
        assert_eq!(body["data"]["successful_requests"], 1);
    }
}
