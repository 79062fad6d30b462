//! The message endpoint. One POST per user turn; partial failures are
//! already folded into the reply text by the agent runtime, so anything
//! that reaches the error arm here produced nothing at all.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use carelog_agent::AgentRuntime;

#[derive(Clone)]
pub struct ApiState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub user_id: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/api/messages", post(process)).with_state(ApiState { runtime })
}

pub async fn process(
    State(state): State<ApiState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.runtime.process_message(request.user_id, &request.message).await {
        Ok(response) => Ok(Json(MessageResponse { response })),
        Err(error) => {
            tracing::error!(
                event_name = "api.message_failed",
                user_id = request.user_id,
                reason = %error,
                "message processing failed"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: error.user_message() }),
            ))
        }
    }
}
