mod service;

use axum::{
    Json, Router, debug_handler,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{AppResult, AppState, extract::JsonBody, models::NewMessage};

pub use service::MessageService;

/// Header carrying the caller's participant name.
pub const USER_HEADER: &str = "user";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListMessagesQuery {
    limit: Option<String>,
}

impl ListMessagesQuery {
    /// Anything that is not a positive integer means "no limit".
    fn limit(&self) -> Option<u64> {
        self.limit
            .as_deref()
            .and_then(|limit| limit.trim().parse::<u64>().ok())
            .filter(|&limit| limit > 0)
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/messages", get(list_messages).post(post_message))
}

fn user(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_HEADER).and_then(|user| user.to_str().ok())
}

#[debug_handler(state = AppState)]
async fn list_messages(
    State(service): State<MessageService>,
    headers: HeaderMap,
    Query(query): Query<ListMessagesQuery>,
) -> AppResult<Response> {
    let messages = service.list(user(&headers), query.limit()).await?;
    Ok(Json(messages).into_response())
}

#[debug_handler(state = AppState)]
async fn post_message(
    State(service): State<MessageService>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<NewMessage>,
) -> AppResult<Response> {
    service.post(user(&headers), body).await?;
    Ok(StatusCode::CREATED.into_response())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, None)]
    #[case(Some("10"), Some(10))]
    #[case(Some(" 7 "), Some(7))]
    #[case(Some("0"), None)]
    #[case(Some("-5"), None)]
    #[case(Some("dez"), None)]
    #[case(Some(""), None)]
    fn limit_must_be_a_positive_integer(#[case] raw: Option<&str>, #[case] expected: Option<u64>) {
        let query = ListMessagesQuery { limit: raw.map(str::to_owned) };
        assert_eq!(query.limit(), expected);
    }
}
