use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};
use thiserror::Error as ThisError;
use tracing::error;

use super::CrudError;

#[derive(Debug, ThisError)]
pub enum PorticoError {
    #[error(transparent)]
    Crud(#[from] CrudError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl IntoResponse for PorticoError {
    fn into_response(self) -> axum::response::Response {
        match self {
            PorticoError::NotFound => {
                (StatusCode::NOT_FOUND, Html("<h1>404 Not Found</h1>")).into_response()
            }
            other => {
                // Details stay in the log.
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<h1>500 Internal Server Error</h1>"),
                )
                    .into_response()
            }
        }
    }
}
