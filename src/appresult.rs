use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{store::StoreError, validate::ValidationError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("participant {0:?} already exists")]
    Conflict(String),
    #[error("{0}")]
    Storage(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(ValidationError { messages }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(messages)).into_response()
            }
            AppError::Conflict(_) => StatusCode::CONFLICT.into_response(),
            AppError::Storage(StoreError(err)) => {
                error!("{err:#}\n\n{}", err.backtrace());
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
