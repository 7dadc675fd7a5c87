use std::env;

use url::Url;

use crate::error::AuthError;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_PORT: u16 = 3010;
const DEFAULT_MONGODB_DB: &str = "callback";

/// Client credentials for one OAuth provider.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub server: SmtpConfig,
    pub from: String,
}

/// Page-route overrides. Paths are relative to the public base URL.
#[derive(Debug, Clone)]
pub struct Pages {
    pub sign_in: String,
    pub verify_request: String,
    pub new_user: String,
    pub error: String,
}

impl Default for Pages {
    fn default() -> Self {
        Self {
            sign_in: "/register".to_string(),
            verify_request: "/auth/verify-request".to_string(),
            new_user: "/auth/new-user".to_string(),
            // errors land on the sign-in page with an `error` query parameter
            error: "/register".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub base_url: Url,
    pub secret: String,
    pub jwt_secret: String,
    pub facebook: Option<ClientCredentials>,
    pub google: Option<ClientCredentials>,
    pub email: Option<EmailSettings>,
    pub pages: Pages,
    pub mongodb_uri: Option<String>,
    pub mongodb_db: String,
    pub port: u16,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secret = get("NEXTAUTH_SECRET")
            .ok_or_else(|| AuthError::Config("NEXTAUTH_SECRET must be set".to_string()))?;
        let jwt_secret = get("NEXTAUTH_JWT_SECRET").unwrap_or_else(|| secret.clone());

        let base_url_raw = get("NEXTAUTH_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url_raw)
            .map_err(|e| AuthError::Config(format!("Invalid NEXTAUTH_URL '{}': {}", base_url_raw, e)))?;

        let credentials = |id_key: &str, secret_key: &str| match (get(id_key), get(secret_key)) {
            (Some(client_id), Some(client_secret)) => Some(ClientCredentials { client_id, client_secret }),
            _ => {
                tracing::warn!("{} / {} not set; provider disabled", id_key, secret_key);
                None
            }
        };
        let facebook = credentials("FACEBOOK_CLIENT_ID", "FACEBOOK_CLIENT_SECRET");
        let google = credentials("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET");

        let email = match get("SMTP_HOST") {
            Some(host) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw
                        .parse::<u16>()
                        .map_err(|_| AuthError::Config(format!("Invalid SMTP_PORT '{}'", raw)))?,
                    None => DEFAULT_SMTP_PORT,
                };
                let from = get("EMAIL_FROM").ok_or_else(|| {
                    AuthError::Config("EMAIL_FROM must be set when SMTP_HOST is configured".to_string())
                })?;
                Some(EmailSettings {
                    server: SmtpConfig {
                        host,
                        port,
                        user: get("SMTP_USER"),
                        password: get("SMTP_PASSWORD"),
                    },
                    from,
                })
            }
            None => {
                tracing::warn!("SMTP_HOST not set; email provider disabled");
                None
            }
        };

        let port = match get("AUTH_SERVICE_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AuthError::Config(format!("Invalid AUTH_SERVICE_PORT '{}'", raw)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            base_url,
            secret,
            jwt_secret,
            facebook,
            google,
            email,
            pages: Pages::default(),
            mongodb_uri: get("MONGODB_URI"),
            mongodb_db: get("MONGODB_DB").unwrap_or_else(|| DEFAULT_MONGODB_DB.to_string()),
            port,
        })
    }

    /// Absolute URL of a path on the public site.
    pub fn page_url(&self, path: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthError::Internal(format!("Invalid page path '{}': {}", path, e)))
    }

    /// Absolute URL of an auth route, e.g. `callback/google`.
    pub fn auth_url(&self, route: &str) -> Result<Url, AuthError> {
        self.page_url(&format!("/api/auth/{}", route.trim_start_matches('/')))
    }

    pub fn use_secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}
