use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::{
    error_redirect, redirect, verify_csrf, CALLBACK_URL_KEY, CSRF_KEY, OAUTH_STATE_KEY, PKCE_KEY,
};
use crate::crypto::{hash_token, random_token};
use crate::error::AuthError;
use crate::models::{normalize_email, VerificationToken};
use crate::providers::{email::send_verification_request, ProviderId};
use crate::signin::resolve_callback_url;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailSignInForm {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
    #[serde(rename = "csrfToken", default)]
    pub csrf_token: String,
}

pub async fn csrf(session: Session) -> Result<HttpResponse, AuthError> {
    let token = match session.get::<String>(CSRF_KEY)? {
        Some(token) => token,
        None => {
            let token = random_token();
            session.insert(CSRF_KEY, &token)?;
            token
        }
    };

    Ok(HttpResponse::Ok().json(json!({ "csrfToken": token })))
}

pub async fn providers(state: web::Data<AppState>) -> Result<HttpResponse, AuthError> {
    let mut body = serde_json::Map::new();
    for id in state.providers.ids() {
        let kind = match id {
            ProviderId::Email => "email",
            _ => "oauth",
        };
        body.insert(
            id.to_string(),
            json!({
                "id": id.as_str(),
                "name": id.display_name(),
                "type": kind,
                "signinUrl": state.config.auth_url(&format!("signin/{}", id))?.as_str(),
                "callbackUrl": state.config.auth_url(&format!("callback/{}", id))?.as_str(),
            }),
        );
    }

    Ok(HttpResponse::Ok().json(serde_json::Value::Object(body)))
}

/// The sign-in UI lives on the registration page of the web app.
pub async fn signin_page(
    query: web::Query<SignInQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AuthError> {
    let mut url = state.config.page_url(&state.config.pages.sign_in)?;
    if let Some(callback_url) = query.callback_url.as_deref() {
        let callback_url = resolve_callback_url(&state.config.base_url, Some(callback_url));
        url.query_pairs_mut()
            .append_pair("callbackUrl", callback_url.as_str());
    }
    Ok(redirect(&url))
}

pub async fn oauth_signin(
    path: web::Path<String>,
    query: web::Query<SignInQuery>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AuthError> {
    let id: ProviderId = path.parse()?;
    let provider = state.providers.oauth(id)?;
    let callback_url = resolve_callback_url(&state.config.base_url, query.callback_url.as_deref());

    let request = state.oauth.authorization_request(provider)?;
    session.insert(OAUTH_STATE_KEY, &request.state)?;
    match &request.pkce_verifier {
        Some(verifier) => session.insert(PKCE_KEY, verifier)?,
        None => {
            session.remove(PKCE_KEY);
        }
    }
    session.insert(CALLBACK_URL_KEY, callback_url.as_str())?;

    tracing::info!(provider = %id, "Redirecting to provider for authorization");
    Ok(redirect(&request.url))
}

pub async fn email_signin(
    form: web::Form<EmailSignInForm>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AuthError> {
    verify_csrf(&session, &form.csrf_token)?;

    if let Err(validation_errors) = form.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Validation failed",
            "details": validation_errors
        })));
    }

    let provider = state.providers.email()?;
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AuthError::InvalidProvider(ProviderId::Email.to_string()))?;

    let email = normalize_email(&form.email);
    let callback_url = resolve_callback_url(&state.config.base_url, form.callback_url.as_deref());

    let token = random_token();
    let hashed = hash_token(&token, &state.config.secret);
    state
        .adapter
        .create_verification_token(VerificationToken {
            identifier: email.clone(),
            token: hashed.clone(),
            expires: Utc::now() + provider.max_age,
        })
        .await?;

    let mut link = state.config.auth_url("callback/email")?;
    link.query_pairs_mut()
        .append_pair("callbackUrl", callback_url.as_str())
        .append_pair("token", &token)
        .append_pair("email", &email);

    if let Err(e) =
        send_verification_request(state.adapter.as_ref(), mailer.as_ref(), &email, link.as_str()).await
    {
        tracing::error!(to = %email, "Failed to send verification request: {}", e);
        // nobody can follow a link that was never sent
        if let Err(cleanup) = state.adapter.use_verification_token(&email, &hashed).await {
            tracing::warn!(to = %email, "Failed to discard unsent verification token: {}", cleanup);
        }
        return Ok(error_redirect(&state, &e));
    }

    let mut verify_request = state.config.page_url(&state.config.pages.verify_request)?;
    verify_request
        .query_pairs_mut()
        .append_pair("provider", ProviderId::Email.as_str())
        .append_pair("type", "email");
    Ok(redirect(&verify_request))
}
