use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::verify_csrf;
use crate::error::AuthError;
use crate::models::SessionResponse;
use crate::session::SESSION_COOKIE;
use crate::signin::resolve_callback_url;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignOutForm {
    #[serde(rename = "csrfToken", default)]
    pub csrf_token: String,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Current session, or an empty object when signed out.
pub async fn session(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        return HttpResponse::Ok().json(json!({}));
    };

    match state.sessions.verify(cookie.value()) {
        Ok(claims) => HttpResponse::Ok().json(SessionResponse::from(claims)),
        Err(e) => {
            tracing::debug!("Discarding invalid session token: {}", e);
            HttpResponse::Ok()
                .cookie(state.sessions.removal_cookie())
                .json(json!({}))
        }
    }
}

pub async fn signout(
    form: web::Form<SignOutForm>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AuthError> {
    verify_csrf(&session, &form.csrf_token)?;

    let url = resolve_callback_url(&state.config.base_url, form.callback_url.as_deref());
    Ok(HttpResponse::Ok()
        .cookie(state.sessions.removal_cookie())
        .json(json!({ "url": url.as_str() })))
}
