use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::{config::ConfigError, feed::error::FeedError};

#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<TrackerError> for std::io::Error {
    fn from(e: TrackerError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, e)
    }
}

impl ResponseError for TrackerError {
    fn error_response(&self) -> HttpResponse {
        match self {
            TrackerError::NotFound(message) => {
                HttpResponse::build(self.status_code()).json(json!({ "error": message }))
            }
            other => {
                log::error!("{}", other);
                HttpResponse::InternalServerError().finish()
            }
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
