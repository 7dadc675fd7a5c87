use chrono::Utc;
use url::Url;

use crate::adapter::Adapter;
use crate::error::{AuthError, AuthResult};
use crate::models::{
    normalize_email, AccountType, AdapterAccount, AdapterUser, NewUser, ProfileUser,
};
use crate::oauth::ProviderTokens;
use crate::providers::OAuthProviderConfig;

#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub user: AdapterUser,
    pub is_new_user: bool,
}

/// Finds the local user behind a provider profile, linking or creating one
/// when needed.
pub async fn resolve_oauth_user(
    adapter: &dyn Adapter,
    provider: &OAuthProviderConfig,
    profile: ProfileUser,
    tokens: ProviderTokens,
) -> AuthResult<SignInOutcome> {
    let provider_name = provider.id.as_str();

    if let Some(user) = adapter.get_user_by_account(provider_name, &profile.id).await? {
        return Ok(SignInOutcome {
            user,
            is_new_user: false,
        });
    }

    let existing = match profile.email.as_deref() {
        Some(email) => adapter.get_user_by_email(&normalize_email(email)).await?,
        None => None,
    };

    let provider_account_id = profile.id.clone();
    let (user, is_new_user) = match existing {
        Some(user) if provider.allow_dangerous_email_account_linking => {
            tracing::info!(user_id = %user.id, provider = provider_name, "Linking account by email");
            (user, false)
        }
        Some(_) => return Err(AuthError::AccountNotLinked),
        None => {
            let user = adapter.create_user(NewUser::from(profile)).await?;
            tracing::info!(user_id = %user.id, provider = provider_name, "Registered user from provider profile");
            (user, true)
        }
    };

    adapter
        .link_account(AdapterAccount {
            user_id: user.id.clone(),
            account_type: AccountType::Oauth,
            provider: provider_name.to_string(),
            provider_account_id,
            access_token: Some(tokens.access_token),
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            token_type: tokens.token_type,
            scope: tokens.scope,
        })
        .await?;

    Ok(SignInOutcome { user, is_new_user })
}

/// Finds or creates the user behind a verified email address.
pub async fn resolve_email_user(adapter: &dyn Adapter, email: &str) -> AuthResult<SignInOutcome> {
    if let Some(user) = adapter.get_user_by_email(email).await? {
        return Ok(SignInOutcome {
            user,
            is_new_user: false,
        });
    }

    let user = adapter
        .create_user(NewUser {
            email: Some(email.to_string()),
            email_verified: Some(Utc::now()),
            ..Default::default()
        })
        .await?;
    tracing::info!(user_id = %user.id, "Registered user from email sign-in");

    Ok(SignInOutcome {
        user,
        is_new_user: true,
    })
}

/// Keeps redirects on the public site: relative paths are joined onto the
/// base url and foreign origins fall back to the base url.
pub fn resolve_callback_url(base: &Url, raw: Option<&str>) -> Url {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return base.clone();
    };

    match base.join(raw) {
        Ok(url) if url.origin() == base.origin() => url,
        _ => base.clone(),
    }
}

/// Where a freshly created user lands: the new-user page, remembering the
/// requested destination.
pub fn new_user_redirect(new_user_page: &Url, callback_url: &Url) -> Url {
    let mut url = new_user_page.clone();
    url.query_pairs_mut()
        .append_pair("callbackUrl", callback_url.as_str());
    url
}
