use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    DatabaseError(String),
    NotFound(String),
    InvalidRequest(String),
    Conflict(String),
    /// No user matches the login phone.
    InvalidCredentials,
    InvalidPassword,
    AccountNotApproved,
    Unauthorized(String),
    Forbidden(String),
    ExternalService(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::NotFound(what) => write!(f, "{} not found", what),
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::InvalidPassword => write!(f, "Invalid password"),
            AppError::AccountNotApproved => write!(f, "Account not approved"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::ExternalService(msg) => write!(f, "External service error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::InvalidRequest(format!("Password hashing failed: {}", e))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials
            | AppError::InvalidPassword
            | AppError::AccountNotApproved
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string()
        }))
    }
}

/// Status of a secondary side effect (remote file deletion) attached to a
/// primary operation that already succeeded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum CleanupStatus {
    NotNeeded,
    Done,
    Failed(String),
}

impl CleanupStatus {
    pub fn from_result(result: Result<(), AppError>) -> Self {
        match result {
            Ok(()) => CleanupStatus::Done,
            Err(e) => CleanupStatus::Failed(e.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CleanupStatus::Failed(_))
    }
}

/// Result of a primary operation together with the status of its cleanup.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub cleanup: CleanupStatus,
}

impl<T> Outcome<T> {
    pub fn new(value: T, cleanup: CleanupStatus) -> Self {
        Self { value, cleanup }
    }
}
