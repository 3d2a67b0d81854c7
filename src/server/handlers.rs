use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::settings;

use super::cluster::{ServerError, cluster_request, cluster_vision_request};
use super::models::{ClusterRequest, ErrorResponse, ServerResponse};
use super::state::ServerState;

pub fn router(settings: settings::Settings) -> Router {
    let state = Arc::new(ServerState { settings });
    Router::new()
        .route("/health", get(health))
        .route("/cluster", post(cluster))
        .route("/cluster/vision", post(cluster_vision))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

pub async fn run_server(settings: settings::Settings, addr: String) -> Result<()> {
    let app = router(settings);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET,POST,OPTIONS"),
    ("access-control-allow-headers", "content-type"),
];

async fn health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "maxWords": state.settings.vision_max_words,
    }))
}

/// Answers preflight requests directly; every other response gets the
/// same headers appended.
async fn cors_middleware(req: Request<Body>, next: Next) -> Response<Body> {
    let mut response = if req.method() == Method::OPTIONS {
        (StatusCode::NO_CONTENT, Body::empty()).into_response()
    } else {
        next.run(req).await
    };
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    for (name, value) in CORS_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

type HandlerResult = Result<Json<ServerResponse>, (StatusCode, Json<ErrorResponse>)>;

async fn cluster(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ClusterRequest>, JsonRejection>,
) -> HandlerResult {
    let Json(payload) = payload.map_err(rejected)?;
    respond(cluster_request(state.as_ref(), payload))
}

async fn cluster_vision(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> HandlerResult {
    let Json(payload) = payload.map_err(rejected)?;
    respond(cluster_vision_request(state.as_ref(), payload))
}

/// Body decoding failures use the same 400 envelope as validation errors.
fn rejected(rejection: JsonRejection) -> (StatusCode, Json<ErrorResponse>) {
    let err = ServerError::bad_request(rejection.body_text());
    (err.status, Json(ErrorResponse::new(err.message)))
}

fn respond(result: Result<crate::ocr::ClusterOutput, ServerError>) -> HandlerResult {
    match result {
        Ok(output) => Ok(Json(ServerResponse {
            success: true,
            output,
        })),
        Err(err) => Err((err.status, Json(ErrorResponse::new(err.message)))),
    }
}
