pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::error::AuthResult;
use crate::models::{AdapterAccount, AdapterUser, NewUser, VerificationToken};

pub use memory::MemoryAdapter;
pub use mongo::MongoAdapter;

/// Persistence for users, linked provider accounts and email verification
/// tokens.
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn create_user(&self, user: NewUser) -> AuthResult<AdapterUser>;

    async fn get_user(&self, id: &str) -> AuthResult<Option<AdapterUser>>;

    async fn get_user_by_email(&self, email: &str) -> AuthResult<Option<AdapterUser>>;

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AuthResult<Option<AdapterUser>>;

    async fn link_account(&self, account: AdapterAccount) -> AuthResult<()>;

    async fn create_verification_token(&self, token: VerificationToken) -> AuthResult<()>;

    /// Removes and returns the matching token. A token can only be used once.
    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> AuthResult<Option<VerificationToken>>;
}
