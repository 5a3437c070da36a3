use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};

use rapidl_client::{
    BackoffPolicy, ClientError, ContentClient, backend_url_from_env_value,
    fetch_attempts_from_env_value,
};
use rapidl_core::{
    ContentError, ContentService, CoreConfig, JobStatus, LOAD_FAILURE_MESSAGE, ViewState,
    config::{indent_step_from_env_value, utc_offset_from_env_value},
};
use rapidl_types::JobId;

/// Application state shared across REST API handlers
///
/// Holds the backend client, which carries the content service configured at startup.
#[derive(Clone)]
struct AppState {
    client: Arc<ContentClient>,
}

impl AppState {
    fn service(&self) -> &ContentService {
        self.client.service()
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(Deserialize, ToSchema)]
struct RenderReq {
    job_id: String,
    /// Job payload exactly as returned by the content backend.
    #[schema(value_type = Object)]
    payload: serde_json::Value,
}

#[derive(Serialize, Deserialize, ToSchema)]
struct ErrorRes {
    message: String,
}

type ApiError = (StatusCode, Json<ErrorRes>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            message: message.into(),
        }),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(health, render_document, fetch_document),
    components(schemas(HealthRes, RenderReq, ViewState, JobStatus, ErrorRes))
)]
struct ApiDoc;

/// Main entry point for the rapidl render service
///
/// Serves the document pipeline over REST on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `RAPIDL_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RAPIDL_BACKEND_URL`: content backend base URL (default: "http://localhost:8000")
/// - `RAPIDL_FETCH_ATTEMPTS`: maximum fetch attempts per document (default: 4)
/// - `RAPIDL_UTC_OFFSET`: viewer offset for displayed times (default: host local offset)
/// - `RAPIDL_INDENT_STEP_REM`: indentation per nesting level (default: 1.25)
///
/// # Errors
/// Returns an error if configuration is invalid, the address cannot be bound, or the server
/// fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rapidl_run=info".parse()?)
                .add_directive("rapidl_core=info".parse()?)
                .add_directive("rapidl_client=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("RAPIDL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let backend_url = backend_url_from_env_value(std::env::var("RAPIDL_BACKEND_URL").ok());
    let attempts = fetch_attempts_from_env_value(std::env::var("RAPIDL_FETCH_ATTEMPTS").ok())?;

    let cfg = Arc::new(CoreConfig::new(
        utc_offset_from_env_value(std::env::var("RAPIDL_UTC_OFFSET").ok())?,
        indent_step_from_env_value(std::env::var("RAPIDL_INDENT_STEP_REM").ok())?,
    )?);

    let client = ContentClient::new(
        &backend_url,
        ContentService::new(cfg.clone()),
        BackoffPolicy::with_attempts(attempts),
    )?;

    tracing::info!("++ Starting rapidl REST on {}", rest_addr);
    // `utc_offset = None` follows the host's local offset per request.
    tracing::info!(
        backend = %backend_url,
        utc_offset = ?cfg.configured_utc_offset(),
        "content backend configured"
    );

    let app = router(AppState {
        client: Arc::new(client),
    });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/documents/render", post(render_document))
        .route("/documents/:job_id", get(fetch_document))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "rapidl REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/documents/render",
    request_body = RenderReq,
    responses(
        (status = 200, description = "Processing or rendered document", body = ViewState),
        (status = 400, description = "Invalid job id", body = ErrorRes),
        (status = 422, description = "Document could not be loaded", body = ErrorRes)
    )
)]
/// Render a job payload supplied by the caller
///
/// # Errors
/// Returns `400 Bad Request` for an invalid job id and `422 Unprocessable Entity` if the payload
/// or its blob cannot be decoded.
async fn render_document(
    State(state): State<AppState>,
    Json(req): Json<RenderReq>,
) -> Result<Json<ViewState>, ApiError> {
    let job_id = parse_job_id(&req.job_id)?;

    state
        .service()
        .load_json(&job_id, &req.payload.to_string())
        .map(Json)
        .map_err(|_| api_error(StatusCode::UNPROCESSABLE_ENTITY, LOAD_FAILURE_MESSAGE))
}

#[utoipa::path(
    get,
    path = "/documents/{job_id}",
    params(("job_id" = String, Path, description = "Content job id")),
    responses(
        (status = 200, description = "Processing or rendered document", body = ViewState),
        (status = 400, description = "Invalid job id", body = ErrorRes),
        (status = 422, description = "Document could not be loaded", body = ErrorRes),
        (status = 502, description = "Content backend unavailable", body = ErrorRes)
    )
)]
/// Fetch a job from the content backend and render it
///
/// # Errors
/// Returns `502 Bad Gateway` if the backend cannot be reached or keeps failing, and
/// `422 Unprocessable Entity` if the fetched document cannot be decoded.
async fn fetch_document(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ViewState>, ApiError> {
    let job_id = parse_job_id(&job_id)?;

    match state.client.load_document(&job_id).await {
        Ok(view) => Ok(Json(view)),
        Err(err) => {
            tracing::error!(%job_id, "fetch document error: {err}");
            let status = match err {
                ClientError::Http(_) | ClientError::Status { .. } => StatusCode::BAD_GATEWAY,
                ClientError::Content(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ClientError::InvalidBackendUrl { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err(api_error(status, LOAD_FAILURE_MESSAGE))
        }
    }
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    JobId::parse(raw)
        .map_err(ContentError::from)
        .map_err(|err| api_error(StatusCode::BAD_REQUEST, err.to_string()))
}
