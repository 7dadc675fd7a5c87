use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::error::AuthResult;
use crate::models::{AdapterUser, SessionClaims, SessionResponse, SessionUser};

pub const SESSION_COOKIE: &str = "auth.session-token";
pub const SESSION_MAX_AGE_DAYS: i64 = 30;

/// Issues and verifies the JWT that carries the session. Nothing is stored
/// server-side.
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    max_age: Duration,
    secure: bool,
}

impl SessionManager {
    pub fn new(jwt_secret: &str, secure: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            max_age: Duration::days(SESSION_MAX_AGE_DAYS),
            secure,
        }
    }

    pub fn issue(&self, user: &AdapterUser) -> AuthResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            registration_type: user.registration_type,
            iat: now.timestamp(),
            exp: (now + self.max_age).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(CookieDuration::seconds(self.max_age.num_seconds()))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .finish();
        cookie.make_removal();
        cookie
    }
}

impl From<SessionClaims> for SessionResponse {
    fn from(claims: SessionClaims) -> Self {
        let expires = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now);
        SessionResponse {
            user: SessionUser {
                id: claims.sub,
                email: claims.email,
                name: claims.name,
                first_name: claims.first_name,
                last_name: claims.last_name,
                registration_type: claims.registration_type,
            },
            expires,
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("max_age", &self.max_age)
            .field("secure", &self.secure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::models::RegistrationType;

    fn user() -> AdapterUser {
        AdapterUser {
            id: "user-1".to_string(),
            email: Some("ana@example.com".to_string()),
            email_verified: None,
            name: Some("Ana Reyes".to_string()),
            first_name: Some("Ana".to_string()),
            last_name: Some("Reyes".to_string()),
            registration_type: Some(RegistrationType::Google),
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let sessions = SessionManager::new("jwt-secret", false);
        let token = sessions.issue(&user()).unwrap();
        let claims = sessions.verify(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.first_name.as_deref(), Some("Ana"));
        assert_eq!(claims.registration_type, Some(RegistrationType::Google));
        assert_eq!(claims.exp - claims.iat, SESSION_MAX_AGE_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = SessionManager::new("one", false).issue(&user()).unwrap();
        let result = SessionManager::new("two", false).verify(&token);
        assert!(matches!(result, Err(AuthError::Session(_))));
    }

    #[test]
    fn test_cookie_flags() {
        let cookie = SessionManager::new("s", true).cookie("tok".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
