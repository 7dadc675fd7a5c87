use actix_session::Session;
use actix_web::{http::header, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use url::Url;

use super::{error_redirect, CALLBACK_URL_KEY, OAUTH_STATE_KEY, PKCE_KEY};
use crate::crypto::{hash_token, secrets_match};
use crate::error::{AuthError, AuthResult};
use crate::models::normalize_email;
use crate::providers::ProviderId;
use crate::signin::{
    new_user_redirect, resolve_callback_url, resolve_email_user, resolve_oauth_user, SignInOutcome,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub token: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

pub async fn callback(
    path: web::Path<String>,
    query: web::Query<CallbackQuery>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AuthError> {
    let id: ProviderId = path.parse()?;
    let query = query.into_inner();

    let result = match id {
        ProviderId::Email => email_callback(&state, query).await,
        _ => oauth_callback(&state, &session, id, query).await,
    };

    match result {
        Ok((outcome, callback_url)) => complete_sign_in(&state, outcome, &callback_url),
        Err(e) => {
            tracing::warn!(provider = %id, "Sign-in failed: {}", e);
            Ok(error_redirect(&state, &e))
        }
    }
}

async fn oauth_callback(
    state: &AppState,
    session: &Session,
    id: ProviderId,
    query: CallbackQuery,
) -> AuthResult<(SignInOutcome, Url)> {
    let provider = state.providers.oauth(id)?;

    let expected_state = session.get::<String>(OAUTH_STATE_KEY)?;
    let pkce_verifier = session.get::<String>(PKCE_KEY)?;
    let callback_url = session.get::<String>(CALLBACK_URL_KEY)?;
    session.remove(OAUTH_STATE_KEY);
    session.remove(PKCE_KEY);
    session.remove(CALLBACK_URL_KEY);

    if let Some(error) = query.error {
        return Err(AuthError::OAuth(format!("{} returned error: {}", id, error)));
    }

    match (expected_state.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(received)) if secrets_match(expected, received) => {}
        _ => return Err(AuthError::InvalidState),
    }

    let code = query
        .code
        .ok_or_else(|| AuthError::OAuth("missing authorization code".to_string()))?;

    let tokens = state.oauth.exchange_code(provider, &code, pkce_verifier).await?;
    let profile = state.oauth.fetch_profile(provider, &tokens.access_token).await?;
    let outcome = resolve_oauth_user(state.adapter.as_ref(), provider, profile, tokens).await?;

    let callback_url = resolve_callback_url(&state.config.base_url, callback_url.as_deref());
    Ok((outcome, callback_url))
}

async fn email_callback(state: &AppState, query: CallbackQuery) -> AuthResult<(SignInOutcome, Url)> {
    state.providers.email()?;

    let (Some(token), Some(email)) = (query.token, query.email) else {
        return Err(AuthError::Verification);
    };
    let email = normalize_email(&email);

    let stored = state
        .adapter
        .use_verification_token(&email, &hash_token(&token, &state.config.secret))
        .await?
        .ok_or(AuthError::Verification)?;
    if stored.expires < Utc::now() {
        return Err(AuthError::Verification);
    }

    let outcome = resolve_email_user(state.adapter.as_ref(), &email).await?;
    let callback_url = resolve_callback_url(&state.config.base_url, query.callback_url.as_deref());
    Ok((outcome, callback_url))
}

fn complete_sign_in(
    state: &AppState,
    outcome: SignInOutcome,
    callback_url: &Url,
) -> Result<HttpResponse, AuthError> {
    let token = state.sessions.issue(&outcome.user)?;

    let target = if outcome.is_new_user {
        let new_user_page = state.config.page_url(&state.config.pages.new_user)?;
        new_user_redirect(&new_user_page, callback_url)
    } else {
        callback_url.clone()
    };

    tracing::info!(
        user_id = %outcome.user.id,
        new_user = outcome.is_new_user,
        "User signed in"
    );

    Ok(HttpResponse::Found()
        .cookie(state.sessions.cookie(token))
        .append_header((header::LOCATION, target.as_str()))
        .finish())
}
