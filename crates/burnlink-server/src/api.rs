use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, Method, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use burnlink_shared::constants::MAX_TTL_SECS;
use burnlink_shared::{NewSecret, SecretId, SecretRecord, SecretStore};
use burnlink_store::SqliteSecretStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::sweeper;

/// Clock skew tolerated on top of the 24 hour ceiling.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Room for the JSON wrapper around `encrypted_content`.
const BODY_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: SqliteSecretStore,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let body_limit = state.config.max_content_size.saturating_add(BODY_OVERHEAD);

    Router::new()
        .route("/health", get(health_check))
        .route("/secrets", post(create_secret))
        .route("/secrets/{id}", get(get_secret).delete(delete_secret))
        .route("/secrets/{id}/take", post(take_secret))
        .route("/admin/sweep", post(admin_sweep))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    instance: String,
}

#[derive(Deserialize)]
struct CreateSecretRequest {
    encrypted_content: String,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct CreateSecretResponse {
    id: SecretId,
}

#[derive(Serialize)]
struct SweepResponse {
    deleted: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        instance: state.config.instance_name.clone(),
    })
}

async fn create_secret(
    State(state): State<AppState>,
    Json(req): Json<CreateSecretRequest>,
) -> Result<(StatusCode, Json<CreateSecretResponse>), ServerError> {
    validate_new_secret(&req, state.config.max_content_size, Utc::now())?;

    let size = req.encrypted_content.len();
    let id = state
        .store
        .insert(NewSecret {
            encrypted_content: req.encrypted_content,
            expires_at: req.expires_at,
        })
        .await?;

    info!(%id, size, expires_at = %req.expires_at, "Secret stored");
    Ok((StatusCode::CREATED, Json(CreateSecretResponse { id })))
}

fn validate_new_secret(
    req: &CreateSecretRequest,
    max_size: usize,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    if req.encrypted_content.trim().is_empty() {
        return Err(ServerError::BadRequest("encrypted_content is empty".into()));
    }

    let size = req.encrypted_content.len();
    if size > max_size {
        return Err(ServerError::TooLarge {
            size,
            max: max_size,
        });
    }

    if req.expires_at <= now {
        return Err(ServerError::BadRequest("expires_at is in the past".into()));
    }
    if req.expires_at > now + Duration::seconds(MAX_TTL_SECS + EXPIRY_SKEW_SECS) {
        return Err(ServerError::BadRequest(
            "expires_at is beyond the 24 hour limit".into(),
        ));
    }

    Ok(())
}

async fn get_secret(
    State(state): State<AppState>,
    Path(id): Path<SecretId>,
) -> Result<Json<SecretRecord>, ServerError> {
    state
        .store
        .fetch(id)
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound)
}

async fn delete_secret(
    State(state): State<AppState>,
    Path(id): Path<SecretId>,
) -> Result<StatusCode, ServerError> {
    state.store.delete(id).await?;
    info!(%id, "Secret deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn take_secret(
    State(state): State<AppState>,
    Path(id): Path<SecretId>,
) -> Result<Json<SecretRecord>, ServerError> {
    let record = state.store.take(id).await?.ok_or(ServerError::NotFound)?;
    info!(%id, "Secret taken");
    Ok(Json(record))
}

fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ServerError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    use subtle::ConstantTimeEq;
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

async fn admin_sweep(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<SweepResponse>, ServerError> {
    verify_admin_token(&headers, &state.config)?;

    let deleted = sweeper::sweep_once(&state.store, Utc::now()).await?;
    info!(deleted, "Admin sweep");
    Ok(Json(SweepResponse { deleted }))
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
