use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AuthResult;
use crate::models::{AdapterAccount, AdapterUser, NewUser, VerificationToken};

use super::Adapter;

/// In-process adapter used when no database is configured, and by tests.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    users: DashMap<String, AdapterUser>,
    accounts: DashMap<(String, String), AdapterAccount>,
    tokens: DashMap<(String, String), VerificationToken>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Verification tokens currently held, expired ones included.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn accounts_for(&self, user_id: &str) -> Vec<AdapterAccount> {
        self.accounts
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn create_user(&self, user: NewUser) -> AuthResult<AdapterUser> {
        let created = AdapterUser {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            email_verified: user.email_verified,
            name: user.name,
            first_name: user.first_name,
            last_name: user.last_name,
            registration_type: user.registration_type,
        };
        self.users.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: &str) -> AuthResult<Option<AdapterUser>> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> AuthResult<Option<AdapterUser>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().email.as_deref() == Some(email))
            .map(|entry| entry.value().clone()))
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AuthResult<Option<AdapterUser>> {
        let user_id = match self
            .accounts
            .get(&(provider.to_string(), provider_account_id.to_string()))
        {
            Some(account) => account.user_id.clone(),
            None => return Ok(None),
        };
        self.get_user(&user_id).await
    }

    async fn link_account(&self, account: AdapterAccount) -> AuthResult<()> {
        let key = (account.provider.clone(), account.provider_account_id.clone());
        self.accounts.insert(key, account);
        Ok(())
    }

    async fn create_verification_token(&self, token: VerificationToken) -> AuthResult<()> {
        let now = Utc::now();
        self.tokens.retain(|_, stored| stored.expires > now);

        let key = (token.identifier.clone(), token.token.clone());
        self.tokens.insert(key, token);
        Ok(())
    }

    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> AuthResult<Option<VerificationToken>> {
        Ok(self
            .tokens
            .remove(&(identifier.to_string(), token.to_string()))
            .map(|(_, v)| v))
    }
}
