use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::error::HistoryError;

/// JSON envelope returned by every FFI entry point.
#[derive(Debug, Serialize, Deserialize)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    ValidationError(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl From<HistoryError> for AppResponse {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::StorageFailure(msg) => AppResponse::DatabaseError(msg),
            HistoryError::WorkerStopped | HistoryError::WorkerSpawn(_) => {
                AppResponse::DatabaseError(err.to_string())
            }
            HistoryError::MalformedDocument(msg) => {
                AppResponse::ValidationError(format!("Malformed document: {}", msg))
            }
            HistoryError::Validation(msg) => AppResponse::ValidationError(msg),
            HistoryError::Serialization(e) => AppResponse::from(e),
            HistoryError::Config(msg) => AppResponse::BadRequest(format!("Invalid configuration: {}", msg)),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }
}
