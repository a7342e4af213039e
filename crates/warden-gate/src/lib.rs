//! Decision delivery endpoint for warden approval requests
//!
//! This crate is the boundary through which a human's approve/deny input
//! reaches the approval coordinator. It exposes:
//!
//! - `GET /approvals` - the set of currently pending requests
//! - `POST /approvals/:id/decide` - deliver an approve/deny decision
//!
//! Rendering is out of scope; any human-facing surface consumes these two
//! operations. There is deliberately no access control here: who may reach
//! the endpoint is the deployment's concern, not the core contract's.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use warden_core::{ApprovalCoordinator, ApprovalStatus, PendingApproval, Verdict, WardenError};

/// Shared endpoint state
#[derive(Clone)]
struct AppState {
    coordinator: Arc<ApprovalCoordinator>,
}

/// Body of a decide request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideBody {
    /// The human's decision: approved or denied
    pub decision: Verdict,
    /// Identity string of the human actor, recorded in the audit trail
    pub decided_by: String,
}

/// Response to a successful decide request
#[derive(Debug, Serialize, Deserialize)]
pub struct DecideResponse {
    pub id: Uuid,
    pub status: ApprovalStatus,
}

/// Error payload returned for rejected decisions
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

struct ApiError(WardenError);

impl From<WardenError> for ApiError {
    fn from(err: WardenError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WardenError::UnknownRequest(_) => StatusCode::NOT_FOUND,
            WardenError::AlreadyResolved { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorBody {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

/// Build the endpoint router around a coordinator
pub fn router(coordinator: Arc<ApprovalCoordinator>) -> Router {
    Router::new()
        .route("/approvals", get(list_pending))
        .route("/approvals/:id/decide", post(decide))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { coordinator })
}

/// Bind a listener and run the endpoint until shutdown
pub async fn serve(addr: SocketAddr, coordinator: Arc<ApprovalCoordinator>) -> std::io::Result<()> {
    let app = router(coordinator);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("decision endpoint listening on http://{}", addr);
    axum::serve(listener, app).await
}

async fn list_pending(State(state): State<AppState>) -> Json<Vec<PendingApproval>> {
    Json(state.coordinator.pending())
}

async fn decide(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<DecideBody>,
) -> Result<Json<DecideResponse>, ApiError> {
    state
        .coordinator
        .resolve(id, body.decision, &body.decided_by)?;
    Ok(Json(DecideResponse {
        id,
        status: body.decision.into(),
    }))
}
