//! Shopping-assistant route handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Form data for an assistant question.
#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub question: String,
}

/// Assistant reply.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub reply: String,
    /// False when the reply is failure guidance rather than a model answer.
    pub ok: bool,
}

/// Answer a shopper's question against the current catalog.
///
/// Gateway failures become the assistant's reply - a human-readable message
/// per failure mode - rather than an HTTP error, so the conversation surface
/// never crashes. No automatic retry; the shopper can simply ask again.
#[instrument(skip(state, form))]
pub async fn ask(
    State(state): State<AppState>,
    Json(form): Json<AskForm>,
) -> Result<Json<AskResponse>> {
    let question = form.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("question must not be empty".to_owned()));
    }

    let catalog = state.products().list().await?;

    match state.assistant().ask(question, &catalog).await {
        Ok(reply) => Ok(Json(AskResponse { reply, ok: true })),
        Err(e) => {
            warn!(error = %e, "assistant call failed");
            Ok(Json(AskResponse {
                reply: e.user_message(),
                ok: false,
            }))
        }
    }
}
