use serde::Deserialize;

use crate::config::ClientCredentials;
use crate::error::{AuthError, AuthResult};
use crate::models::{ProfileUser, RegistrationType};

use super::{OAuthProviderConfig, ProviderId, UserInfoEndpoint};

pub const AUTHORIZATION_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";
pub const TOKEN_URL: &str = "https://graph.facebook.com/v19.0/oauth/access_token";
pub const USERINFO_URL: &str = "https://graph.facebook.com/v19.0/me";
pub const USERINFO_FIELDS: &str = "id,name,email,first_name,last_name";

/// Graph API `/me` payload for the requested fields.
#[derive(Debug, Clone, Deserialize)]
pub struct FacebookProfile {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub fn map_profile(profile: FacebookProfile) -> ProfileUser {
    ProfileUser {
        id: profile.id,
        first_name: profile.first_name,
        last_name: profile.last_name,
        email: profile.email,
        registration_type: RegistrationType::Facebook,
    }
}

fn profile_from_value(raw: serde_json::Value) -> AuthResult<ProfileUser> {
    let profile: FacebookProfile = serde_json::from_value(raw)
        .map_err(|e| AuthError::UserInfo(format!("Unexpected Facebook profile: {}", e)))?;
    Ok(map_profile(profile))
}

pub fn provider(credentials: ClientCredentials) -> OAuthProviderConfig {
    OAuthProviderConfig {
        id: ProviderId::Facebook,
        credentials,
        authorization_url: AUTHORIZATION_URL.to_string(),
        token_url: TOKEN_URL.to_string(),
        userinfo: UserInfoEndpoint {
            url: USERINFO_URL.to_string(),
            params: vec![("fields".to_string(), USERINFO_FIELDS.to_string())],
        },
        scopes: vec!["email".to_string()],
        use_pkce: false,
        allow_dangerous_email_account_linking: true,
        profile: profile_from_value,
    }
}
