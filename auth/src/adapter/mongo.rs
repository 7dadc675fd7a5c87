// MongoAdapter stores users, accounts and verification tokens in three
// collections. Ids are ObjectIds; the string form is what the rest of the
// service sees.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::models::{
    AccountType, AdapterAccount, AdapterUser, NewUser, RegistrationType, VerificationToken,
};

use super::Adapter;

const USERS: &str = "users";
const ACCOUNTS: &str = "accounts";
const VERIFICATION_TOKENS: &str = "verification_tokens";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    // left out when absent so the sparse unique index skips it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    email_verified: Option<BsonDateTime>,
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    registration_type: Option<RegistrationType>,
}

impl From<UserDocument> for AdapterUser {
    fn from(doc: UserDocument) -> Self {
        AdapterUser {
            id: doc.id.to_hex(),
            email: doc.email,
            email_verified: doc.email_verified.and_then(from_bson_datetime),
            name: doc.name,
            first_name: doc.first_name,
            last_name: doc.last_name,
            registration_type: doc.registration_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    user_id: ObjectId,
    #[serde(rename = "type")]
    account_type: AccountType,
    provider: String,
    provider_account_id: String,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    token_type: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VerificationTokenDocument {
    identifier: String,
    token: String,
    expires: BsonDateTime,
}

fn to_bson_datetime(value: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(value.timestamp_millis())
}

fn from_bson_datetime(value: BsonDateTime) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(value.timestamp_millis()).single()
}

fn parse_object_id(id: &str) -> AuthResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| AuthError::Database(format!("Invalid id '{}': {}", id, e)))
}

/// Lookup index for single-use consumption, plus a TTL index so MongoDB drops
/// each token once its `expires` time has passed.
fn verification_token_indexes() -> Vec<IndexModel> {
    vec![
        IndexModel::builder()
            .keys(doc! { "identifier": 1, "token": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build(),
        IndexModel::builder()
            .keys(doc! { "expires": 1 })
            .options(IndexOptions::builder().expire_after(Duration::ZERO).build())
            .build(),
    ]
}

#[derive(Debug, Clone)]
pub struct MongoAdapter {
    db: Database,
}

impl MongoAdapter {
    /// Binds the adapter to an already connected client handle.
    pub fn new(client: &Client, db_name: &str) -> Self {
        Self {
            db: client.database(db_name),
        }
    }

    pub async fn connect(uri: &str, db_name: &str) -> AuthResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let adapter = Self::new(&client, db_name);
        adapter.db.run_command(doc! { "ping": 1 }).await?;
        adapter.ensure_indexes().await?;
        Ok(adapter)
    }

    pub async fn ensure_indexes(&self) -> AuthResult<()> {
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).sparse(true).build())
                    .build(),
            )
            .await?;
        self.accounts()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "provider": 1, "providerAccountId": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        self.verification_tokens()
            .create_indexes(verification_token_indexes())
            .await?;
        Ok(())
    }

    fn users(&self) -> Collection<UserDocument> {
        self.db.collection(USERS)
    }

    fn accounts(&self) -> Collection<AccountDocument> {
        self.db.collection(ACCOUNTS)
    }

    fn verification_tokens(&self) -> Collection<VerificationTokenDocument> {
        self.db.collection(VERIFICATION_TOKENS)
    }
}

#[async_trait]
impl Adapter for MongoAdapter {
    async fn create_user(&self, user: NewUser) -> AuthResult<AdapterUser> {
        let document = UserDocument {
            id: ObjectId::new(),
            email: user.email,
            email_verified: user.email_verified.map(to_bson_datetime),
            name: user.name,
            first_name: user.first_name,
            last_name: user.last_name,
            registration_type: user.registration_type,
        };
        self.users().insert_one(&document).await?;
        tracing::info!(user_id = %document.id, "Created user");
        Ok(document.into())
    }

    async fn get_user(&self, id: &str) -> AuthResult<Option<AdapterUser>> {
        let id = parse_object_id(id)?;
        let user = self.users().find_one(doc! { "_id": id }).await?;
        Ok(user.map(Into::into))
    }

    async fn get_user_by_email(&self, email: &str) -> AuthResult<Option<AdapterUser>> {
        let user = self.users().find_one(doc! { "email": email }).await?;
        Ok(user.map(Into::into))
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AuthResult<Option<AdapterUser>> {
        let account = self
            .accounts()
            .find_one(doc! { "provider": provider, "providerAccountId": provider_account_id })
            .await?;

        match account {
            Some(account) => {
                let user = self.users().find_one(doc! { "_id": account.user_id }).await?;
                Ok(user.map(Into::into))
            }
            None => Ok(None),
        }
    }

    async fn link_account(&self, account: AdapterAccount) -> AuthResult<()> {
        let document = AccountDocument {
            id: ObjectId::new(),
            user_id: parse_object_id(&account.user_id)?,
            account_type: account.account_type,
            provider: account.provider,
            provider_account_id: account.provider_account_id,
            access_token: account.access_token,
            refresh_token: account.refresh_token,
            expires_at: account.expires_at,
            token_type: account.token_type,
            scope: account.scope,
        };
        self.accounts().insert_one(&document).await?;
        tracing::info!(
            user_id = %document.user_id,
            provider = %document.provider,
            "Linked account"
        );
        Ok(())
    }

    async fn create_verification_token(&self, token: VerificationToken) -> AuthResult<()> {
        let document = VerificationTokenDocument {
            identifier: token.identifier,
            token: token.token,
            expires: to_bson_datetime(token.expires),
        };
        self.verification_tokens().insert_one(&document).await?;
        Ok(())
    }

    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> AuthResult<Option<VerificationToken>> {
        let document = self
            .verification_tokens()
            .find_one_and_delete(doc! { "identifier": identifier, "token": token })
            .await?;

        Ok(document.and_then(|d| {
            from_bson_datetime(d.expires).map(|expires| VerificationToken {
                identifier: d.identifier,
                token: d.token,
                expires,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_document_conversion() {
        let id = ObjectId::new();
        let verified = Utc.timestamp_millis_opt(1_700_000_000_000).single().unwrap();
        let user: AdapterUser = UserDocument {
            id,
            email: Some("ana@example.com".to_string()),
            email_verified: Some(to_bson_datetime(verified)),
            name: None,
            first_name: Some("Ana".to_string()),
            last_name: None,
            registration_type: Some(RegistrationType::Facebook),
        }
        .into();

        assert_eq!(user.id, id.to_hex());
        assert_eq!(user.email_verified, Some(verified));
        assert_eq!(user.registration_type, Some(RegistrationType::Facebook));
    }

    #[test]
    fn test_verification_tokens_expire_at_their_deadline() {
        let indexes = verification_token_indexes();
        let ttl = indexes
            .iter()
            .find(|index| index.keys == doc! { "expires": 1 })
            .expect("ttl index on expires");
        let options = ttl.options.as_ref().unwrap();
        assert_eq!(options.expire_after, Some(Duration::ZERO));
    }

    #[test]
    fn test_invalid_object_id() {
        assert!(matches!(parse_object_id("not-an-id"), Err(AuthError::Database(_))));
    }
}
