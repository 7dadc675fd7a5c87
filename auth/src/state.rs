use std::sync::Arc;

use crate::adapter::Adapter;
use crate::config::AuthConfig;
use crate::mail::Mailer;
use crate::oauth::OAuthService;
use crate::providers::Providers;
use crate::session::SessionManager;

/// Shared, read-only handles every request works with.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthConfig>,
    pub providers: Arc<Providers>,
    pub adapter: Arc<dyn Adapter>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub oauth: OAuthService,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(
        config: AuthConfig,
        providers: Providers,
        adapter: Arc<dyn Adapter>,
        mailer: Option<Arc<dyn Mailer>>,
        http: reqwest::Client,
    ) -> Self {
        let oauth = OAuthService::new(&config, http);
        let sessions = SessionManager::new(&config.jwt_secret, config.use_secure_cookies());
        Self {
            config: Arc::new(config),
            providers: Arc::new(providers),
            adapter,
            mailer,
            oauth,
            sessions,
        }
    }
}
