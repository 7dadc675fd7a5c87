pub mod email;
pub mod facebook;
pub mod google;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{AuthConfig, ClientCredentials};
use crate::error::{AuthError, AuthResult};
use crate::models::ProfileUser;

pub use email::EmailProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Facebook,
    Google,
    Email,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Facebook => "facebook",
            ProviderId::Google => "google",
            ProviderId::Email => "email",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Facebook => "Facebook",
            ProviderId::Google => "Google",
            ProviderId::Email => "Email",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "facebook" => Ok(ProviderId::Facebook),
            "google" => Ok(ProviderId::Google),
            "email" => Ok(ProviderId::Email),
            other => Err(AuthError::InvalidProvider(other.to_string())),
        }
    }
}

/// Turns a raw userinfo payload into the local user shape.
pub type ProfileMapper = fn(serde_json::Value) -> AuthResult<ProfileUser>;

#[derive(Debug, Clone)]
pub struct UserInfoEndpoint {
    pub url: String,
    /// Extra query parameters sent with the userinfo request.
    pub params: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct OAuthProviderConfig {
    pub id: ProviderId,
    pub credentials: ClientCredentials,
    pub authorization_url: String,
    pub token_url: String,
    pub userinfo: UserInfoEndpoint,
    pub scopes: Vec<String>,
    pub use_pkce: bool,
    pub allow_dangerous_email_account_linking: bool,
    pub profile: ProfileMapper,
}

impl std::fmt::Debug for OAuthProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthProviderConfig")
            .field("id", &self.id)
            .field("client_id", &self.credentials.client_id)
            .field("authorization_url", &self.authorization_url)
            .field("token_url", &self.token_url)
            .field("userinfo", &self.userinfo)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Every provider enabled by the current configuration.
#[derive(Debug, Clone, Default)]
pub struct Providers {
    pub oauth: Vec<OAuthProviderConfig>,
    pub email: Option<EmailProvider>,
}

impl Providers {
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut oauth = Vec::new();
        if let Some(credentials) = &config.facebook {
            oauth.push(facebook::provider(credentials.clone()));
        }
        if let Some(credentials) = &config.google {
            oauth.push(google::provider(credentials.clone()));
        }
        let email = config.email.clone().map(EmailProvider::new);

        tracing::info!(
            oauth = ?oauth.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            email = email.is_some(),
            "Configured authentication providers"
        );

        Self { oauth, email }
    }

    pub fn oauth(&self, id: ProviderId) -> AuthResult<&OAuthProviderConfig> {
        self.oauth
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AuthError::InvalidProvider(id.to_string()))
    }

    pub fn email(&self) -> AuthResult<&EmailProvider> {
        self.email
            .as_ref()
            .ok_or_else(|| AuthError::InvalidProvider(ProviderId::Email.to_string()))
    }

    pub fn ids(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.oauth.iter().map(|p| p.id).collect();
        if self.email.is_some() {
            ids.push(ProviderId::Email);
        }
        ids
    }
}
