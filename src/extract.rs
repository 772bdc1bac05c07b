use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{AppError, validate::ValidationError};

/// JSON request body that always ends up in front of the validator.
///
/// A request without a JSON content type is read as an empty object, so the
/// validator reports the missing fields. A body that parses but is not an
/// object is a validation failure. Malformed JSON keeps axum's rejection.
#[derive(Debug, Clone, Default)]
pub struct JsonBody<T>(pub T);

fn not_an_object() -> Response {
    AppError::from(ValidationError {
        messages: vec![r#""value" must be of type object"#.to_owned()],
    })
    .into_response()
}

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let value = match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => value,
            Err(JsonRejection::MissingJsonContentType(_)) => return Ok(Self(T::default())),
            Err(rejection) => return Err(rejection.into_response()),
        };

        if !value.is_object() {
            return Err(not_an_object());
        }

        serde_json::from_value(value)
            .map(Self)
            .map_err(|_| not_an_object())
    }
}
