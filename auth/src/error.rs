use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unknown provider: {0}")]
    InvalidProvider(String),
    #[error("Invalid or missing OAuth state")]
    InvalidState,
    #[error("Invalid CSRF token")]
    Csrf,
    #[error("OAuth error: {0}")]
    OAuth(String),
    #[error("Failed to fetch user info: {0}")]
    UserInfo(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Mail error: {0}")]
    Mail(String),
    #[error("Session error: {0}")]
    Session(String),
    #[error("Account is not linked to this sign-in method")]
    AccountNotLinked,
    #[error("Verification token is invalid or expired")]
    Verification,
    #[error("No user found for {0}")]
    UserNotFound(String),
    #[error("Invalid verification url: {0}")]
    InvalidVerificationUrl(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Error code appended to the error page url when a browser flow fails.
    pub fn page_code(&self) -> &'static str {
        match self {
            AuthError::OAuth(_) | AuthError::UserInfo(_) | AuthError::InvalidState => "OAuthCallback",
            AuthError::Mail(_) | AuthError::UserNotFound(_) | AuthError::InvalidVerificationUrl(_) => "EmailSignin",
            AuthError::Csrf => "MissingCSRF",
            AuthError::AccountNotLinked => "OAuthAccountNotLinked",
            AuthError::Verification => "Verification",
            _ => "Callback",
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_)
            | AuthError::InvalidProvider(_)
            | AuthError::InvalidState
            | AuthError::InvalidVerificationUrl(_) => StatusCode::BAD_REQUEST,
            AuthError::Csrf => StatusCode::FORBIDDEN,
            AuthError::AccountNotLinked | AuthError::Verification => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AuthError::OAuth(_) | AuthError::UserInfo(_) | AuthError::Mail(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AuthError::Config(_) | AuthError::Internal(_) | AuthError::Session(_) => "Internal server error",
            AuthError::Validation(_) => "Validation failed",
            AuthError::InvalidProvider(_) => "Invalid provider",
            AuthError::InvalidState => "Invalid state",
            AuthError::Csrf => "Invalid CSRF token",
            AuthError::OAuth(_) | AuthError::UserInfo(_) => "OAuth provider error",
            AuthError::Database(_) => "Database error",
            AuthError::Mail(_) => "Failed to send email",
            AuthError::AccountNotLinked => "Account not linked",
            AuthError::Verification => "Verification failed",
            AuthError::UserNotFound(_) => "User not found",
            AuthError::InvalidVerificationUrl(_) => "Invalid verification url",
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": error,
            "message": self.to_string()
        }))
    }
}

impl From<mongodb::error::Error> for AuthError {
    fn from(err: mongodb::error::Error) -> Self {
        AuthError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::UserInfo(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::Session(err.to_string())
    }
}

impl From<lettre::error::Error> for AuthError {
    fn from(err: lettre::error::Error) -> Self {
        AuthError::Mail(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for AuthError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        AuthError::Mail(err.to_string())
    }
}

impl From<lettre::address::AddressError> for AuthError {
    fn from(err: lettre::address::AddressError) -> Self {
        AuthError::Mail(format!("Invalid mailbox: {}", err))
    }
}

impl From<actix_session::SessionInsertError> for AuthError {
    fn from(err: actix_session::SessionInsertError) -> Self {
        AuthError::Session(err.to_string())
    }
}

impl From<actix_session::SessionGetError> for AuthError {
    fn from(err: actix_session::SessionGetError) -> Self {
        AuthError::Session(err.to_string())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
