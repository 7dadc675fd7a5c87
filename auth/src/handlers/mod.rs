pub mod callback;
pub mod session;
pub mod signin;

use actix_session::{
    config::CookieContentSecurity, storage::CookieSessionStore, Session, SessionMiddleware,
};
use actix_web::{
    cookie::{Key, SameSite},
    http::header,
    web, HttpResponse, ResponseError,
};
use url::Url;

use crate::config::AuthConfig;
use crate::crypto::{cookie_key_material, secrets_match};
use crate::error::{AuthError, AuthResult};
use crate::state::AppState;

pub(crate) const CSRF_KEY: &str = "csrf_token";
pub(crate) const OAUTH_STATE_KEY: &str = "oauth_state";
pub(crate) const PKCE_KEY: &str = "pkce_verifier";
pub(crate) const CALLBACK_URL_KEY: &str = "callback_url";

const FLOW_COOKIE: &str = "auth.flow";

/// Encrypted cookie holding short-lived flow state (csrf token, oauth state,
/// pkce verifier). The login session itself is the JWT cookie.
pub fn session_middleware(config: &AuthConfig) -> SessionMiddleware<CookieSessionStore> {
    let key = Key::from(&cookie_key_material(&config.secret));
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(FLOW_COOKIE.to_string())
        .cookie_secure(config.use_secure_cookies())
        .cookie_same_site(SameSite::Lax)
        .cookie_content_security(CookieContentSecurity::Private)
        .build()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api/auth")
            .route("/csrf", web::get().to(signin::csrf))
            .route("/providers", web::get().to(signin::providers))
            .route("/signin", web::get().to(signin::signin_page))
            .route("/signin/email", web::post().to(signin::email_signin))
            .route("/signin/{provider}", web::get().to(signin::oauth_signin))
            .route("/callback/{provider}", web::get().to(callback::callback))
            .route("/session", web::get().to(session::session))
            .route("/signout", web::post().to(session::signout)),
    );
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "callback-auth",
        "timestamp": chrono::Utc::now()
    }))
}

pub(crate) fn redirect(url: &Url) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, url.as_str()))
        .finish()
}

/// Sends the browser to the error page with a short error code.
pub(crate) fn error_redirect(state: &AppState, err: &AuthError) -> HttpResponse {
    match state.config.page_url(&state.config.pages.error) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("error", err.page_code());
            redirect(&url)
        }
        Err(e) => e.error_response(),
    }
}

pub(crate) fn verify_csrf(session: &Session, submitted: &str) -> AuthResult<()> {
    match session.get::<String>(CSRF_KEY)? {
        Some(expected) if !submitted.is_empty() && secrets_match(&expected, submitted) => Ok(()),
        _ => {
            tracing::warn!("CSRF token mismatch");
            Err(AuthError::Csrf)
        }
    }
}
