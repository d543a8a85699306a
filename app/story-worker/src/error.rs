//! HTTP error mapping for the local app API.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{Classify, ErrorClass, ErrorResponse};
use local_store::StoreError;
use offline_sync::SyncError;
use request_cache::{CacheError, FetchError};
use story_gateway::GatewayError;
use story_model::ModelError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The story API refused the request; carries its status and message.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network unavailable: {0}")]
    Offline(String),

    #[error("Local storage unavailable: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn class(&self) -> Option<ErrorClass> {
        match self {
            AppError::BadRequest(_) => Some(ErrorClass::Validation),
            AppError::Unauthorized(_) => Some(ErrorClass::AuthRequired),
            AppError::Rejected { .. } => Some(ErrorClass::RemoteRejected),
            AppError::Offline(_) => Some(ErrorClass::NetworkUnavailable),
            AppError::Storage(_) => Some(ErrorClass::StorageUnavailable),
            AppError::NotFound(_) | AppError::Internal(_) => None,
        }
    }

    fn from_class(class: ErrorClass, message: String) -> Self {
        match class {
            ErrorClass::Validation => AppError::BadRequest(message),
            ErrorClass::AuthRequired => AppError::Unauthorized(message),
            ErrorClass::NetworkUnavailable => AppError::Offline(message),
            ErrorClass::StorageUnavailable => AppError::Storage(message),
            ErrorClass::RemoteRejected => AppError::Rejected {
                status: 502,
                message,
            },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Rejected { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::Offline(_) | AppError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = match self.class() {
            Some(class) => class.as_str(),
            None if matches!(self, AppError::NotFound(_)) => "not_found",
            None => "internal",
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(code, self.to_string()))
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::RemoteRejected { status, message } => {
                AppError::Rejected { status, message }
            }
            GatewayError::AuthRequired(message) | GatewayError::InvalidCredentials(message) => {
                AppError::Unauthorized(message)
            }
            other => AppError::from_class(other.class(), other.to_string()),
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Gateway(e) => e.into(),
            other => AppError::from_class(other.class(), other.to_string()),
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network(message) => AppError::Rejected {
                status: 502,
                message,
            },
            FetchError::InvalidRequest(message) => AppError::BadRequest(message),
        }
    }
}
