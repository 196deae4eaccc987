use crate::config::{ApiConfig, LedgerConfig};
use crate::db::DatabaseService;
use crate::error::Error;
use crate::ledger::RecordStore;
use crate::services::Relay;
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
    pub store: Arc<dyn RecordStore>,
    pub ledger: LedgerConfig,
    /// Set when the ledger lives in Postgres
    pub database: Option<Arc<DatabaseService>>,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    pub status: u16,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) | Error::LedgerNotFound(_) => StatusCode::NOT_FOUND,
            Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::LockTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            message: err.to_string(),
            status: status.as_u16(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<Error>() {
            return (*err).clone().into();
        }

        ApiError {
            message: err.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(self);
        (status, body).into_response()
    }
}

pub struct RestApi {
    config: ApiConfig,
    media_root: PathBuf,
    state: AppState,
}

impl RestApi {
    /// `media_root` is served under `/media` and `/files`
    pub fn new(config: &ApiConfig, media_root: PathBuf, state: AppState) -> Self {
        Self {
            config: config.clone(),
            media_root,
            state,
        }
    }

    pub fn router(&self) -> Router {
        use std::time::Duration;
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(false)
            .max_age(Duration::from_secs(3600));

        Router::new()
            .route("/webhook", post(webhook))
            .route("/health", get(health))
            .with_state(self.state.clone())
            .nest_service("/media", ServeDir::new(&self.media_root))
            .nest_service("/files", ServeDir::new(&self.media_root))
            .layer(cors)
    }

    pub async fn run(&self) -> Result<()> {
        let app = self.router();

        let addr = self.config.address.clone() + ":" + &self.config.port.to_string();
        let addr: SocketAddr = addr.parse()?;
        info!("API server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::Server::from_tcp(listener.into_std()?)?
            .serve(app.into_make_service())
            .await?;

        Ok(())
    }
}

/// motionEye hooks and chat callbacks share this endpoint. Failures are a
/// bare 500; the caller gets no detail.
async fn webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            warn!("Webhook body is not JSON: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.relay.handle(&body).await {
        Ok(()) => Json(json!({"status": "accepted"})).into_response(),
        Err(e) => {
            error!("Webhook failed: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let database = match &state.database {
        Some(db) => Some(db.health_check().await?),
        None => None,
    };
    if database == Some(false) {
        return Err(ApiError {
            message: "Database is unreachable".to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
        });
    }

    let ledger_exists = state.store.exists(&state.ledger).await?;
    Ok(Json(json!({
        "status": "ok",
        "ledger": state.ledger.name,
        "ledger_exists": ledger_exists,
        "database": database,
    })))
}
