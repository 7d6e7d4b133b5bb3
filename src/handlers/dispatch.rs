use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use super::malformed;
use crate::services::reservation::{Envelope, EnvelopeReply};
use crate::state::AppState;

// POST /api/dispatch
//
// Always 200: the outcome travels inside the envelope.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Envelope>, JsonRejection>,
) -> Json<EnvelopeReply> {
    match payload {
        Ok(Json(envelope)) => Json(state.api.dispatch(envelope).await),
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "rejected envelope");
            Json(EnvelopeReply {
                req_id: Value::Null,
                result: malformed(rejection),
            })
        }
    }
}
