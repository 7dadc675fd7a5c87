use serde::Deserialize;

use crate::config::ClientCredentials;
use crate::error::{AuthError, AuthResult};
use crate::models::{ProfileUser, RegistrationType};

use super::{OAuthProviderConfig, ProviderId, UserInfoEndpoint};

pub const AUTHORIZATION_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// OpenID Connect userinfo claims.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

pub fn map_profile(profile: GoogleProfile) -> ProfileUser {
    ProfileUser {
        id: profile.sub,
        first_name: profile.given_name,
        last_name: profile.family_name,
        email: profile.email,
        registration_type: RegistrationType::Google,
    }
}

fn profile_from_value(raw: serde_json::Value) -> AuthResult<ProfileUser> {
    let profile: GoogleProfile = serde_json::from_value(raw)
        .map_err(|e| AuthError::UserInfo(format!("Unexpected Google profile: {}", e)))?;
    Ok(map_profile(profile))
}

pub fn provider(credentials: ClientCredentials) -> OAuthProviderConfig {
    OAuthProviderConfig {
        id: ProviderId::Google,
        credentials,
        authorization_url: AUTHORIZATION_URL.to_string(),
        token_url: TOKEN_URL.to_string(),
        userinfo: UserInfoEndpoint {
            url: USERINFO_URL.to_string(),
            params: Vec::new(),
        },
        scopes: vec!["openid".to_string(), "email".to_string(), "profile".to_string()],
        use_pkce: true,
        allow_dangerous_email_account_linking: true,
        profile: profile_from_value,
    }
}
