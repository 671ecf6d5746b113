use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use fanpush_engine::{BootstrapError, ErrorKind, SchedulerError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Could not load the push schedule. {0}")]
    BootstrapFailed(#[from] BootstrapError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("{0}")]
    Scheduler(#[from] SchedulerError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// The machine-readable code sent alongside the error message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameters(_) => ErrorKind::InvalidParameters.code(),
            Self::Scheduler(e) => e.kind().code(),
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            Self::Scheduler(e) => match e.kind() {
                ErrorKind::InvalidParameters => StatusCode::BAD_REQUEST,
                ErrorKind::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::NoCandidates => StatusCode::CONFLICT,
                ErrorKind::StoreOperationFailure => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BootstrapFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string(), "code": self.code() }).to_string())
    }
}
