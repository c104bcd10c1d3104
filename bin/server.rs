// SDN Screen - Screening API Server
// Read-only REST API over the persisted dataset

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use sdn_screen::cache::DEFAULT_TTL;
use sdn_screen::{
    search_entities, BlobStore, DatasetCache, IngestMetadata, SqliteStore, DATASET_KEY,
    METADATA_KEY,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<dyn BlobStore>,
    cache: Arc<DatasetCache>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(code: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(code.to_string()),
        }
    }
}

/// Read-path failures, each with a stable error code
enum ApiError {
    BadRequest(String),
    NotFound(String),
    NoData,
    Internal(anyhow::Error),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::NoData => "no_data",
            ApiError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NoData => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::BadRequest(detail) => eprintln!("Bad request: {}", detail),
            ApiError::NotFound(uid) => eprintln!("Entity not found: {}", uid),
            ApiError::NoData => eprintln!("Read before first ingestion run"),
            ApiError::Internal(e) => eprintln!("Internal error: {:#}", e),
        }
        (self.status(), Json(ApiResponse::err(self.code()))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/search?q=<query>&limit=<n> - Screen a name against the dataset
async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = match params.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => return Err(ApiError::BadRequest("missing or blank q parameter".to_string())),
    };

    let snapshot = state.cache.snapshot()?.ok_or(ApiError::NoData)?;
    let hits = search_entities(snapshot.entities(), &query, params.limit);

    Ok(Json(ApiResponse::ok(hits)))
}

/// GET /api/entities/:uid - Full entity record
async fn entity_detail(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = uid.trim();
    if uid.is_empty() {
        return Err(ApiError::BadRequest("missing uid".to_string()));
    }

    let snapshot = state.cache.snapshot()?.ok_or(ApiError::NoData)?;
    let entity = snapshot
        .find(uid)
        .ok_or_else(|| ApiError::NotFound(uid.to_string()))?;

    Ok(Json(ApiResponse::ok(entity.clone())))
}

/// GET /api/entities - Always a 400; a uid is required
async fn entities_index() -> ApiError {
    ApiError::BadRequest("missing uid".to_string())
}

/// GET /api/meta - Metadata of the last completed ingestion run
async fn get_meta(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.store.get(METADATA_KEY)?.ok_or(ApiError::NoData)?;
    let metadata: IngestMetadata = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;

    Ok(Json(ApiResponse::ok(metadata)))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 SDN Screen - Screening API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Open database
    let db_path = std::env::var("SDN_SCREEN_DB").unwrap_or_else(|_| "sdn-screen.db".to_string());

    if !std::path::Path::new(&db_path).exists() {
        eprintln!("❌ Database not found: {}", db_path);
        eprintln!("   Run: sdn-screen ingest");
        eprintln!("   to build the dataset first.");
        std::process::exit(1);
    }

    let store: Arc<dyn BlobStore> =
        Arc::new(SqliteStore::open(&db_path).expect("Failed to open database"));
    println!("✓ Database opened: {}", db_path);

    match store.get(DATASET_KEY) {
        Ok(Some(_)) => println!("✓ Dataset present"),
        Ok(None) => println!("⚠️  No dataset yet; serving 503 until an ingestion run completes"),
        Err(e) => {
            eprintln!("❌ Failed to read dataset: {:#}", e);
            std::process::exit(1);
        }
    }

    // Create shared state
    let state = AppState {
        store: store.clone(),
        cache: Arc::new(DatasetCache::new(store, DEFAULT_TTL)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/search", get(search_handler))
        .route("/entities", get(entities_index))
        .route("/entities/:uid", get(entity_detail))
        .route("/meta", get(get_meta))
        .with_state(state.clone());

    // Build main router
    let app = Router::new().nest("/api", api_routes).layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Search: http://localhost:3000/api/search?q=<name>");
    println!("   Meta:   http://localhost:3000/api/meta");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
