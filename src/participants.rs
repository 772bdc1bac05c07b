mod service;

use axum::{
    Json, Router, debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{AppResult, AppState, extract::JsonBody, models::NewParticipant};

pub use service::ParticipantService;

pub fn router() -> Router<AppState> {
    Router::new().route("/participants", get(list_participants).post(register_participant))
}

#[debug_handler(state = AppState)]
async fn list_participants(State(service): State<ParticipantService>) -> AppResult<Response> {
    Ok(Json(service.list().await?).into_response())
}

#[debug_handler(state = AppState)]
async fn register_participant(
    State(service): State<ParticipantService>,
    JsonBody(payload): JsonBody<NewParticipant>,
) -> AppResult<Response> {
    service.register(&payload).await?;
    Ok(StatusCode::CREATED.into_response())
}
