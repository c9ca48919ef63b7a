//! stats-api - HTTP query surface over the mention store.
//!
//! Read-only: every endpoint is a deterministic function of store state at
//! call time. Ingestion runs separately (see the `chatstats` binary).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chatstats::analytics::{ActiveColumn, AnalyticsEngine};
use chatstats::config::ChatStatsConfig;
use chatstats::error::StoreError;
use chatstats::model::{Interval, MessageType};
use chatstats::store::{Database, MentionStore};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
struct AppState {
    database: Arc<Database>,
    engine: Arc<AnalyticsEngine>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let config_path = std::env::var("CHATSTATS_CONFIG")
        .unwrap_or_else(|_| "config/chatstats.yaml".to_string());
    let config = match ChatStatsConfig::load_from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "config file not loaded; using defaults + env");
            ChatStatsConfig::from_env()
        }
    };

    let database = Arc::new(
        Database::open(&config.database_url).expect("Failed to open mention store"),
    );
    let store = Arc::new(MentionStore::new(&database));
    let engine = Arc::new(AnalyticsEngine::new(store));

    let state = AppState { database, engine };

    let app = Router::new()
        .route("/mentions/:kind/top", get(top_mentions))
        .route("/mentions/:kind/total", get(total_mentions))
        .route("/activity/:column", get(active_columns))
        .route("/similarity/rooms", get(room_similarity))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("Invalid PORT");

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("stats-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Common query parameters. Room and user filters are comma-separated sets;
/// an absent filter means unrestricted.
#[derive(Debug, Deserialize)]
struct StatsParams {
    days: Option<i64>,
    limit: Option<usize>,
    rooms: Option<String>,
    users: Option<String>,
    value: Option<String>,
    method: Option<String>,
}

impl StatsParams {
    fn interval(&self) -> Interval {
        Interval::last_days(self.days.unwrap_or(1).max(1))
    }

    fn limit(&self) -> usize {
        self.limit.unwrap_or(10)
    }

    fn rooms(&self) -> Vec<String> {
        split_set(self.rooms.as_deref())
    }

    fn users(&self) -> Vec<String> {
        split_set(self.users.as_deref())
    }
}

/// Mentionable kind addressed by the `:kind` path segment.
#[derive(Debug, Clone, Copy)]
enum MentionPath {
    Entity,
    Emoji,
    MessageType,
}

impl MentionPath {
    fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "entity" => Ok(MentionPath::Entity),
            "emoji" => Ok(MentionPath::Emoji),
            "message-type" => Ok(MentionPath::MessageType),
            other => Err(AppError::ValidationError(format!("unknown kind: {}", other))),
        }
    }
}

fn split_set(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Top mentioned values for one kind.
async fn top_mentions(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<StatsParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind = MentionPath::parse(&kind)?;
    let engine = Arc::clone(&state.engine);
    let interval = params.interval();
    let limit = params.limit();
    let rooms = params.rooms();
    let users = params.users();

    let result = tokio::task::spawn_blocking(move || -> Result<serde_json::Value, StoreError> {
        match kind {
            MentionPath::Entity => {
                Ok(serde_json::json!(engine.top_entities(&interval, &rooms, &users, limit)?))
            }
            MentionPath::Emoji => {
                Ok(serde_json::json!(engine.top_emoji(&interval, &rooms, &users, limit)?))
            }
            MentionPath::MessageType => {
                Ok(serde_json::json!(engine.top_message_types(&interval, &rooms, &users, limit)?))
            }
        }
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    result.map(Json).map_err(AppError::from_store)
}

/// Total mentions for one kind, optionally restricted to one value.
async fn total_mentions(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<StatsParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind = MentionPath::parse(&kind)?;
    let message_type = match (kind, params.value.as_deref()) {
        (MentionPath::MessageType, Some(name)) => Some(MessageType::from_name(name).ok_or_else(
            || AppError::ValidationError(format!("unknown message type: {}", name)),
        )?),
        _ => None,
    };

    let engine = Arc::clone(&state.engine);
    let interval = params.interval();
    let rooms = params.rooms();
    let users = params.users();
    let value = params.value.clone();

    let result = tokio::task::spawn_blocking(move || -> Result<i64, StoreError> {
        match kind {
            MentionPath::Entity => engine.total_entities(value.as_ref(), &interval, &rooms, &users),
            MentionPath::Emoji => engine.total_emoji(value.as_ref(), &interval, &rooms, &users),
            MentionPath::MessageType => {
                engine.total_messages(message_type.as_ref(), &interval, &rooms, &users)
            }
        }
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    result
        .map(|total| Json(serde_json::json!({ "total": total })))
        .map_err(AppError::from_store)
}

/// Activity share per room or user, by emoji occurrences (`method=tv`,
/// default) or combined message volume (`method=volume`).
async fn active_columns(
    State(state): State<AppState>,
    Path(column): Path<String>,
    Query(params): Query<StatsParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let column = match column.as_str() {
        "rooms" => ActiveColumn::Room,
        "users" => ActiveColumn::User,
        other => {
            return Err(AppError::ValidationError(format!(
                "unknown column: {}",
                other
            )))
        }
    };
    let by_volume = matches!(params.method.as_deref(), Some("volume"));

    let engine = Arc::clone(&state.engine);
    let interval = params.interval();
    let limit = params.limit();

    let result = tokio::task::spawn_blocking(move || {
        if by_volume {
            engine.active_columns_by_message_volume(column, &interval, limit)
        } else {
            engine.active_columns_by_total_variation(column, &interval, limit)
        }
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    result
        .map(|shares| Json(serde_json::json!(shares)))
        .map_err(AppError::from_store)
}

/// Cross-room similarity matrix over mentioned values.
async fn room_similarity(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = Arc::clone(&state.engine);
    let interval = params.interval();

    let result =
        tokio::task::spawn_blocking(move || engine.room_similarities_by_value(&interval))
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

    result
        .map(|matrix| Json(serde_json::json!(matrix)))
        .map_err(AppError::from_store)
}

/// Health check endpoint (liveness)
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "stats-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint - verifies store connectivity
async fn readiness_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    let database = Arc::clone(&state.database);
    let ready = tokio::task::spawn_blocking(move || database.test_connection().is_ok())
        .await
        .unwrap_or(false);

    if ready {
        Ok(Json(serde_json::json!({
            "status": "ready",
            "service": "stats-api",
            "store": "connected"
        })))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

// Error handling

#[derive(Debug)]
enum AppError {
    ValidationError(String),
    Unavailable(String),
    InternalError(String),
}

impl AppError {
    fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(detail) => AppError::Unavailable(detail),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({
            "error": message
        }))).into_response()
    }
}
