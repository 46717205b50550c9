//! HTTP endpoints
//!
//! Thin session-lifecycle REST surface: job postings, session creation,
//! channel connect info, and end-of-session reporting. The interview
//! itself runs over the WebSocket in `websocket.rs`.

use std::time::Duration;

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use interviewer_agent::{FinalReport, SessionScorer};
use interviewer_core::{InterviewStage, JobPosting, Rubric};
use interviewer_transport::{interview_channel, issue_connection_token};

use crate::state::AppState;
use crate::websocket::WebSocketHandler;

/// How long the end-of-session path waits for background persistence
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    drop(config);

    Router::new()
        // Job & session management
        .route("/api/jobs", post(create_job).get(list_jobs))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id/connect", get(connect_session))
        .route("/api/sessions/:id/end", post(end_session))
        // Health check
        .route("/health", get(health_check))
        // Candidate audio WebSocket
        .route("/ws/interview/:session_id", get(WebSocketHandler::handle))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();

    if parsed.is_empty() {
        CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    #[serde(default)]
    pub stack: Vec<String>,
    pub rubric: Rubric,
}

async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobPosting>), (StatusCode, String)> {
    request
        .rubric
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let job = JobPosting::new(request.title, request.stack, request.rubric);
    let id = state.jobs.insert(job.clone());
    tracing::info!(job_id = %id, title = %job.title, "Job posting created");

    Ok((StatusCode::CREATED, Json(job)))
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobPosting>> {
    Json(state.jobs.list())
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub job_id: Uuid,
    pub candidate_name: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub job_title: String,
    pub candidate_name: String,
    pub stage: InterviewStage,
    pub started_at: DateTime<Utc>,
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), StatusCode> {
    if request.candidate_name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let job = state
        .jobs
        .get(&request.job_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    let entry = state
        .sessions
        .create(&job, request.candidate_name.trim())
        .map_err(StatusCode::from)?;

    let session = entry.session.read();
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: session.id,
            job_title: session.job_title.clone(),
            candidate_name: session.candidate_name.clone(),
            stage: session.stage,
            started_at: session.started_at,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub session_id: Uuid,
    pub candidate_name: String,
    pub job_title: String,
    pub token: String,
    pub ws_url: String,
    pub channel: String,
    pub status: String,
}

/// Called by the candidate front-end right before the interview starts to
/// get the channel token and transport URLs.
async fn connect_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConnectResponse>, StatusCode> {
    let entry = state
        .sessions
        .get(&session_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    let (candidate_name, job_title) = {
        let session = entry.session.read();
        (session.candidate_name.clone(), session.job_title.clone())
    };

    let config = state.config.read();
    let safe_name = candidate_name.replace(' ', "_").to_lowercase();
    let subject = format!("cand_{}_{}", safe_name, &session_id.to_string()[..8]);
    let token = issue_connection_token(
        &config.channel.token_secret,
        &subject,
        config.channel.token_ttl_secs,
    )
    .map_err(|e| {
        tracing::error!(session_id = %session_id, "token issue failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(ConnectResponse {
        session_id,
        candidate_name,
        job_title,
        token,
        ws_url: config.channel.ws_url.clone(),
        channel: interview_channel(&config.channel.namespace, &session_id),
        status: "ready".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub session_id: Uuid,
    pub candidate_name: String,
    #[serde(flatten)]
    pub report: FinalReport,
}

/// End a session: drain background persistence, aggregate the final
/// report, and signal completion on the channel.
async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<EndSessionResponse>, StatusCode> {
    let entry = state
        .sessions
        .get(&session_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    // All dispatched recorder tasks must land before aggregation
    {
        let runtime = entry.runtime.lock().await;
        if let Some(runtime) = runtime.as_ref() {
            runtime.shutdown(DRAIN_TIMEOUT).await;
        }
    }

    let records = state
        .metrics
        .list_for_session(&session_id)
        .await
        .map_err(|e| {
            tracing::error!(session_id = %session_id, "metric read failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let report = SessionScorer::score(&records);
    entry.complete(report.overall_score);

    if let Err(e) = state.publisher.publish_interview_complete(&session_id).await {
        tracing::warn!(session_id = %session_id, "completion publish failed: {}", e);
    }

    let candidate_name = entry.session.read().candidate_name.clone();
    tracing::info!(
        session_id = %session_id,
        score = report.overall_score,
        turns = report.timeline.len(),
        "Session ended"
    );

    Ok(Json(EndSessionResponse {
        session_id,
        candidate_name,
        report,
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
