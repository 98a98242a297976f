//! HTTP front end for a fitted [`SentimentModel`].
//!
//! | Route              | Response                                        |
//! |--------------------|-------------------------------------------------|
//! | `GET /`            | `Server is running`                             |
//! | `POST /prediction` | `{"post_id", "comment", "prediction"}` as JSON  |
//!
//! Request problems are reported as `{"error": "..."}`: 422 for a missing or
//! mistyped field, 400 for a body that is not a JSON object, 500 if the
//! model itself fails.

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::classifier::{ClassifierError, SentimentModel};
use crate::dataset::Sentiment;

/// Body of `GET /`.
pub const LIVENESS_MESSAGE: &str = "Server is running";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allow cross-origin requests from any origin
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors: true,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Caller-chosen identifier echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PostId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Text(s) => f.write_str(s),
            PostId::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub post_id: PostId,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub post_id: PostId,
    pub comment: String,
    pub prediction: Sentiment,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            RequestError::MissingField(_) | RequestError::InvalidType { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }
}

impl PredictionRequest {
    /// Validates a decoded JSON body. A `null` field counts as missing.
    pub fn from_json(body: &Value) -> Result<Self, RequestError> {
        let fields = body
            .as_object()
            .ok_or_else(|| RequestError::MalformedBody("expected a JSON object".into()))?;

        let post_id = match fields.get("post_id") {
            None | Some(Value::Null) => return Err(RequestError::MissingField("post_id")),
            Some(Value::String(s)) => PostId::Text(s.clone()),
            Some(Value::Number(n)) => PostId::Number(n.clone()),
            Some(_) => {
                return Err(RequestError::InvalidType {
                    field: "post_id",
                    expected: "a string or a number",
                })
            }
        };

        let comment = match fields.get("comment") {
            None | Some(Value::Null) => return Err(RequestError::MissingField("comment")),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(RequestError::InvalidType {
                    field: "comment",
                    expected: "a string",
                })
            }
        };

        Ok(Self { post_id, comment })
    }
}

/// Everything a handler can fail with, mapped to a status code.
#[derive(Debug)]
pub enum ApiError {
    Request(RequestError),
    Prediction(ClassifierError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Request(RequestError::MalformedBody(rejection.body_text()))
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::Request(err)
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        ApiError::Prediction(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Request(err) => (err.status(), err.to_string()),
            ApiError::Prediction(err) => {
                error!("Prediction failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    model: Arc<SentimentModel>,
}

async fn home() -> &'static str {
    LIVENESS_MESSAGE
}

async fn prediction(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(body) = payload?;
    let request = PredictionRequest::from_json(&body)?;
    info!("Prediction request post_id={} comment={:?}", request.post_id, request.comment);

    let prediction = state.model.predict(&request.comment)?;
    Ok(Json(PredictionResponse {
        post_id: request.post_id,
        comment: request.comment,
        prediction: prediction.sentiment,
    }))
}

/// Builds the application router around a shared model.
pub fn router(model: Arc<SentimentModel>, cors: bool) -> Router {
    let app = Router::new()
        .route("/", get(home))
        .route("/prediction", post(prediction))
        .with_state(AppState { model });

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Binds `config.bind_addr()` and serves until Ctrl+C.
pub async fn serve(config: &ServerConfig, model: Arc<SentimentModel>) -> anyhow::Result<()> {
    let app = router(model, config.cors);
    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("HTTP server running on http://{}", listener.local_addr()?);
    info!("  GET  /            - Health check");
    info!("  POST /prediction  - Classify a comment");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
