use chrono::Utc;
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthType, AuthUrl, AuthorizationCode,
    ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::Client;
use url::Url;

use crate::config::AuthConfig;
use crate::crypto::token_debug;
use crate::error::{AuthError, AuthResult};
use crate::models::ProfileUser;
use crate::providers::OAuthProviderConfig;

/// Where to send the browser, and what must be remembered until it comes back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
    pub pkce_verifier: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

/// Drives the authorization code flow through the `oauth2` crate and reads the
/// provider's userinfo endpoint.
#[derive(Clone)]
pub struct OAuthService {
    http: Client,
    base_url: Url,
}

impl OAuthService {
    pub fn new(config: &AuthConfig, http: Client) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
        }
    }

    pub fn redirect_uri(&self, provider: &OAuthProviderConfig) -> AuthResult<Url> {
        self.base_url
            .join(&format!("/api/auth/callback/{}", provider.id))
            .map_err(|e| AuthError::Internal(format!("Invalid redirect uri: {}", e)))
    }

    fn client(&self, provider: &OAuthProviderConfig) -> AuthResult<BasicClient> {
        let auth_url = AuthUrl::new(provider.authorization_url.clone())
            .map_err(|e| AuthError::Config(format!("{} authorization url: {}", provider.id, e)))?;
        let token_url = TokenUrl::new(provider.token_url.clone())
            .map_err(|e| AuthError::Config(format!("{} token url: {}", provider.id, e)))?;
        let redirect_url = RedirectUrl::from_url(self.redirect_uri(provider)?);

        Ok(BasicClient::new(
            ClientId::new(provider.credentials.client_id.clone()),
            Some(ClientSecret::new(provider.credentials.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(redirect_url))
    }

    pub fn authorization_request(&self, provider: &OAuthProviderConfig) -> AuthResult<AuthorizationRequest> {
        let client = self.client(provider)?;
        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(provider.scopes.iter().cloned().map(Scope::new));

        let mut pkce_verifier = None;
        if provider.use_pkce {
            let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
            request = request.set_pkce_challenge(challenge);
            pkce_verifier = Some(verifier.secret().clone());
        }

        let (url, state) = request.url();
        Ok(AuthorizationRequest {
            url,
            state: state.secret().clone(),
            pkce_verifier,
        })
    }

    pub async fn exchange_code(
        &self,
        provider: &OAuthProviderConfig,
        code: &str,
        pkce_verifier: Option<String>,
    ) -> AuthResult<ProviderTokens> {
        let client = self.client(provider)?;
        let mut request = client.exchange_code(AuthorizationCode::new(code.to_string()));
        if let Some(verifier) = pkce_verifier {
            request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier));
        }

        let token = request.request_async(async_http_client).await.map_err(|e| {
            tracing::error!(provider = %provider.id, "Token exchange failed: {}", e);
            AuthError::OAuth(format!("{} token exchange failed: {}", provider.id, e))
        })?;

        let tokens = ProviderTokens {
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            expires_at: token
                .expires_in()
                .map(|d| Utc::now().timestamp() + d.as_secs() as i64),
            token_type: Some(token.token_type().as_ref().to_string()),
            scope: token.scopes().map(|scopes| {
                scopes.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ")
            }),
        };

        tracing::info!(
            provider = %provider.id,
            expires_at = ?tokens.expires_at,
            token = %token_debug(&tokens.access_token),
            "Token exchange successful"
        );
        Ok(tokens)
    }

    pub async fn fetch_profile(
        &self,
        provider: &OAuthProviderConfig,
        access_token: &str,
    ) -> AuthResult<ProfileUser> {
        let response = self
            .http
            .get(&provider.userinfo.url)
            .bearer_auth(access_token)
            .query(&provider.userinfo.params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::UserInfo(format!(
                "{} userinfo returned {}: {}",
                provider.id, status, body
            )));
        }

        let raw: serde_json::Value = response.json().await?;
        (provider.profile)(raw)
    }
}
