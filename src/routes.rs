use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{AppState, error::AppResult, models::InboundMessage, templates::Reply};

#[derive(Debug, Serialize)]
pub struct OutboundMessage {
    pub channel_id: String,
    pub reply: Reply,
}

pub async fn messages(
    State(state): State<Arc<AppState>>,
    Json(msg): Json<InboundMessage>,
) -> AppResult<Response> {
    if msg.channel_id.trim().is_empty() {
        return Err(anyhow::anyhow!("channel_id is required").into());
    }

    let response = match state.dispatcher.handle(&msg).await {
        Some(reply) => Json(OutboundMessage { channel_id: msg.channel_id, reply }).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}
