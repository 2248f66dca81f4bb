//! HTTP API for the router.
//!
//! JSON in, JSON out. Handlers are thin: they translate between HTTP and the
//! interaction/routing layers and map errors to status codes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

use crate::{
    base::types::{ChatMessage, ClassificationRequest, ClassificationResult, StaffAssignment, SummaryRequest, Ticket, Void},
    interaction::intake::{self, IntakeOutcome, NewTicket, TicketNotFound},
    runtime::Runtime,
};

type ApiError = (StatusCode, String);
type ApiResult<T> = Result<T, ApiError>;

// Bodies.

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ai_enabled: bool,
}

/// Classification input; either free text or a conversation (or both).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClassifyBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ClassifyBody {
    /// The request to classify; user messages stand in for a blank description.
    pub fn into_request(self) -> ClassificationRequest {
        let description = if self.description.trim().is_empty() {
            self.messages
                .iter()
                .filter(|m| m.role.eq_ignore_ascii_case("user"))
                .map(|m| m.content.trim())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            self.description
        };

        ClassificationRequest::new(self.title, description)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignResponse {
    pub ticket_id: String,
    pub assigned_to: Option<String>,
}

// Router.

/// Build the API router around a runtime.
pub fn router(runtime: Runtime) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/classify", post(classify))
        .route("/api/summarize", post(summarize))
        .route("/api/tickets", post(create_ticket))
        .route("/api/tickets/:ticket_id", get(get_ticket))
        .route("/api/tickets/:ticket_id/assign", post(assign_ticket))
        .route("/api/staff", post(add_staff))
        .with_state(runtime)
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until Ctrl-C.
#[instrument(skip_all)]
pub async fn serve(runtime: Runtime) -> Void {
    let address = runtime.config.listen_address.clone();
    let listener = TcpListener::bind(&address).await?;

    info!("Listening on http://{address}");

    axum::serve(listener, router(runtime)).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server stopped.");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested."),
        Err(err) => warn!("Could not listen for Ctrl-C: {err}"),
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    error!("Request failed: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn not_found(ticket_id: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("Ticket `{ticket_id}` not found."))
}

// Handlers.

async fn health(State(runtime): State<Runtime>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        ai_enabled: runtime.llm.is_some(),
    })
}

async fn classify(State(runtime): State<Runtime>, Json(body): Json<ClassifyBody>) -> Json<ClassificationResult> {
    let request = body.into_request();

    Json(runtime.classifier.classify(&request).await)
}

async fn summarize(State(runtime): State<Runtime>, Json(request): Json<SummaryRequest>) -> Json<SummaryResponse> {
    let summary = runtime.summarizer.summarize(&request).await;

    Json(SummaryResponse { summary })
}

async fn create_ticket(State(runtime): State<Runtime>, Json(new_ticket): Json<NewTicket>) -> ApiResult<(StatusCode, Json<IntakeOutcome>)> {
    let outcome = intake::handle_new_ticket(new_ticket, &runtime.classifier, &runtime.store, &runtime.assigner)
        .await
        .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn get_ticket(State(runtime): State<Runtime>, Path(ticket_id): Path<String>) -> ApiResult<Json<Ticket>> {
    match runtime.store.get_ticket(&ticket_id).await.map_err(internal)? {
        Some(ticket) => Ok(Json(ticket)),
        None => Err(not_found(&ticket_id)),
    }
}

async fn assign_ticket(State(runtime): State<Runtime>, Path(ticket_id): Path<String>) -> ApiResult<Json<AssignResponse>> {
    match intake::reassign_ticket(&ticket_id, &runtime.store, &runtime.assigner).await {
        Ok(assigned_to) => Ok(Json(AssignResponse { ticket_id, assigned_to })),
        Err(err) if err.is::<TicketNotFound>() => Err(not_found(&ticket_id)),
        Err(err) => Err(internal(err)),
    }
}

async fn add_staff(State(runtime): State<Runtime>, Json(mut assignment): Json<StaffAssignment>) -> ApiResult<(StatusCode, Json<StaffAssignment>)> {
    if assignment.staff_id.trim().is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "Staff ID must not be empty.".to_string()));
    }

    let Some(rule) = runtime.catalog.department(&assignment.department) else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, format!("Unknown department `{}`.", assignment.department)));
    };

    assignment.department = rule.name.clone();

    runtime.store.add_staff_assignment(&assignment).await.map_err(internal)?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

// Tests.
