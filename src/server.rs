//! HTTP trigger for scheduled syncs.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::commands::SyncContext;

/// Shared application state
pub struct AppState {
    ctx: SyncContext,
    /// Held for the whole of a run so one process never syncs twice at once
    running: Mutex<()>,
}

impl AppState {
    pub fn new(ctx: SyncContext) -> Self {
        AppState {
            ctx,
            running: Mutex::new(()),
        }
    }
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert anyhow errors to HTTP responses
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: format!("{:#}", self.0),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/run", get(run_sync).post(run_sync))
        .with_state(state)
}

async fn run_sync(State(state): State<Arc<AppState>>) -> Result<&'static str, AppError> {
    let _running = state.running.lock().await;

    let feed = state.ctx.fetch_feed().await?;
    let (plan, summary) = state.ctx.sync().run(&feed).await.inspect_err(|e| {
        tracing::error!(error = %e, "sync failed");
    })?;

    tracing::info!(
        entries = plan.entry_count,
        meetings = plan.meetings.len(),
        added = summary.created,
        deleted = summary.deleted,
        updated = summary.updated,
        "sync finished"
    );

    Ok("ok")
}
