//! HTTP API gateway for DataGate.
//!
//! Exposes the secure query gateway over REST:
//!
//! - `GET  /health`                    — liveness probe
//! - `POST /v1/query`                  — natural-language query
//! - `GET  /v1/tables`                 — list queryable tables
//! - `GET  /v1/tables/{name}/schema`   — describe one table
//!
//! Built on Axum. Every hard failure maps to a stable error kind and an
//! HTTP status; credential and policy detail never leaks into responses.

pub mod pipeline;

pub use pipeline::{Pipeline, QueryOutcome};

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use datagate_agent::{Orchestrator, Outcome};
use datagate_core::error::{Error, RateLimitError};
use datagate_core::message::SessionId;
use datagate_core::warehouse::Warehouse;
use datagate_policy::{AccessPolicy, AuditLog, CredentialGate, TracingSink};
use datagate_providers::{OpenAiCompatProvider, RetryProvider};
use datagate_query::QueryExecutor;
use datagate_tools::ToolSurface;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

type SharedPipeline = Arc<Pipeline>;

/// Build the Axum router over a wired pipeline.
pub fn build_router(pipeline: SharedPipeline) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/query", post(query_handler))
        .route("/v1/tables", get(tables_handler))
        .route("/v1/tables/{name}/schema", get(schema_handler))
        .with_state(pipeline)
        .layer(DefaultBodyLimit::max(64 * 1024)) // questions, not uploads
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Wire the full pipeline from configuration.
///
/// Fails when no signing secret is configured; everything else has
/// usable defaults.
pub fn build_pipeline(config: &datagate_config::AppConfig) -> Result<Pipeline, Error> {
    let secret = config.auth.secret_key.as_deref().ok_or(Error::Config {
        message: "auth.secret_key is required (set DATAGATE_SECRET_KEY)".into(),
    })?;

    let gate = CredentialGate::new(
        secret,
        config.auth.rate_limit_requests,
        Duration::from_secs(config.auth.rate_limit_window_secs),
    );

    let audit = Arc::new(AuditLog::with_sinks(vec![Box::new(TracingSink)]));

    let warehouse: Arc<dyn Warehouse> = Arc::new(datagate_warehouse::HttpWarehouse::new(
        &config.warehouse.api_url,
        config.warehouse.token.as_deref().unwrap_or_default(),
        &config.warehouse.database,
        &config.warehouse.schema,
        Duration::from_secs(config.warehouse.timeout_secs),
    ));

    let executor = Arc::new(QueryExecutor::new(
        warehouse.clone(),
        AccessPolicy::from_config(&config.policy),
        audit.clone(),
        Duration::from_secs(config.warehouse.timeout_secs),
    ));

    let tools = Arc::new(ToolSurface::new(
        executor.clone(),
        warehouse.clone(),
        audit.clone(),
    ));

    let base_provider = match config.provider.kind.as_str() {
        "vllm" => OpenAiCompatProvider::vllm(config.provider.api_url.as_str()),
        "ollama" => OpenAiCompatProvider::ollama(Some(config.provider.api_url.as_str())),
        "openai_compat" => OpenAiCompatProvider::new(
            "openai_compat",
            &config.provider.api_url,
            config.provider.api_key.as_deref().unwrap_or_default(),
            Duration::from_secs(config.provider.timeout_secs),
        ),
        other => {
            return Err(Error::Config {
                message: format!("provider.kind '{other}' is not recognized"),
            });
        }
    };

    let provider = Arc::new(RetryProvider::new(
        Arc::new(base_provider),
        config.agent.retry_attempts,
        Duration::from_millis(config.agent.retry_backoff_ms),
    ));

    let orchestrator = Orchestrator::new(
        provider,
        tools,
        &config.provider.model,
        config.provider.temperature,
        Some(config.provider.max_tokens),
        config.agent.max_turns,
        config.agent.memory_turn_cap,
    );

    Ok(Pipeline::new(
        gate,
        orchestrator,
        executor,
        warehouse,
        audit,
        Duration::from_secs(config.gateway.request_timeout_secs),
        config.gateway.max_sessions,
    ))
}

/// Start the gateway HTTP server.
pub async fn start(
    config: datagate_config::AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let pipeline = Arc::new(build_pipeline(&config)?);
    let app = build_router(pipeline);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Error mapping ---

/// Wraps the domain error for HTTP rendering.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::Policy(_) => StatusCode::FORBIDDEN,
            Error::Execution(_) | Error::Orchestration(_) => StatusCode::BAD_GATEWAY,
            Error::Config { .. } | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(kind = self.0.kind(), error = %self.0, "Request failed");
        }

        let mut headers = HeaderMap::new();
        if let Error::RateLimit(RateLimitError::QuotaExceeded {
            retry_after_secs, ..
        }) = &self.0
        {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                headers.insert(axum::http::header::RETRY_AFTER, value);
            }
        }

        let body = Json(ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        });

        (status, headers, body).into_response()
    }
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct QueryBody {
    question: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    session_id: String,
    answer: String,
    /// False when the turn budget ran out and `answer` is partial.
    complete: bool,
}

async fn query_handler(
    State(pipeline): State<SharedPipeline>,
    headers: HeaderMap,
    Json(body): Json<QueryBody>,
) -> Result<Json<QueryResponse>, ApiError> {
    let session_id = body.session_id.map(SessionId);
    let result = pipeline
        .submit_query(bearer_token(&headers), &body.question, session_id)
        .await?;

    let complete = matches!(result.outcome, Outcome::Answer(_));
    Ok(Json(QueryResponse {
        session_id: result.session_id.to_string(),
        answer: result.outcome.text().to_string(),
        complete,
    }))
}

#[derive(Serialize)]
struct TablesResponse {
    tables: Vec<String>,
}

async fn tables_handler(
    State(pipeline): State<SharedPipeline>,
    headers: HeaderMap,
) -> Result<Json<TablesResponse>, ApiError> {
    let tables = pipeline.list_tables(bearer_token(&headers)).await?;
    Ok(Json(TablesResponse { tables }))
}

#[derive(Serialize)]
struct SchemaResponse {
    table: String,
    columns: Vec<datagate_core::warehouse::ColumnInfo>,
}

async fn schema_handler(
    State(pipeline): State<SharedPipeline>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<SchemaResponse>, ApiError> {
    let columns = pipeline
        .describe_table(bearer_token(&headers), &name)
        .await?;
    Ok(Json(SchemaResponse {
        table: name,
        columns,
    }))
}
