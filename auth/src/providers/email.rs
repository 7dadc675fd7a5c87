use chrono::Duration;
use url::Url;

use crate::adapter::Adapter;
use crate::config::EmailSettings;
use crate::error::{AuthError, AuthResult};
use crate::mail::{templates, Mailer};

/// How long an emailed sign-in link stays valid.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct EmailProvider {
    pub settings: EmailSettings,
    pub max_age: Duration,
}

impl EmailProvider {
    pub fn new(settings: EmailSettings) -> Self {
        Self {
            settings,
            max_age: Duration::hours(DEFAULT_MAX_AGE_HOURS),
        }
    }
}

/// Whether a magic link is being sent to an existing user or to someone who
/// just filled in the registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFlow {
    Login,
    Registration { first_name: String },
}

/// Reads the flow off the `callbackUrl` embedded in the magic link. The
/// registration form passes the name as a `firstName` parameter.
pub fn detect_flow(url: &str) -> AuthResult<VerificationFlow> {
    let link = Url::parse(url).map_err(|e| AuthError::InvalidVerificationUrl(e.to_string()))?;

    let callback_raw = link
        .query_pairs()
        .find(|(k, _)| k == "callbackUrl")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| AuthError::InvalidVerificationUrl("missing callbackUrl".to_string()))?;

    let callback_url = link
        .join(&callback_raw)
        .map_err(|e| AuthError::InvalidVerificationUrl(format!("callbackUrl: {}", e)))?;

    let first_name = callback_url
        .query_pairs()
        .find(|(k, _)| k == "firstName")
        .map(|(_, v)| v.into_owned());

    Ok(match first_name {
        Some(first_name) => VerificationFlow::Registration { first_name },
        None => VerificationFlow::Login,
    })
}

/// Sends the sign-in link to `identifier`, greeting the user by first name.
pub async fn send_verification_request(
    adapter: &dyn Adapter,
    mailer: &dyn Mailer,
    identifier: &str,
    url: &str,
) -> AuthResult<()> {
    let first_name = match detect_flow(url)? {
        VerificationFlow::Login => {
            let user = adapter
                .get_user_by_email(identifier)
                .await?
                .ok_or_else(|| AuthError::UserNotFound(identifier.to_string()))?;
            user.first_name.unwrap_or_default()
        }
        VerificationFlow::Registration { first_name } => first_name,
    };

    tracing::debug!(to = %identifier, "Sending verification request");
    mailer
        .send(templates::verification_email(identifier, &first_name, url))
        .await
}
