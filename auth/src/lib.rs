// Authentication service for the Callback web app:
// - Facebook and Google social login
// - passwordless magic-link email
// - JWT sessions in an HttpOnly cookie
// - users, accounts and verification tokens in MongoDB

pub mod adapter;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod models;
pub mod oauth;
pub mod providers;
pub mod session;
pub mod signin;
pub mod state;
pub mod telemetry;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use handlers::{configure_routes, session_middleware};
pub use state::AppState;
