use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

/// 32 random bytes, hex encoded.
pub fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash under which a verification token is stored.
pub fn hash_token(token: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// 64 bytes of key material for the signed cookie store.
pub fn cookie_key_material(secret: &str) -> [u8; 64] {
    let digest = Sha512::digest(secret.as_bytes());
    let mut key = [0u8; 64];
    key.copy_from_slice(&digest);
    key
}

/// Compares two secrets without short-circuiting on the first differing byte.
pub fn secrets_match(expected: &str, received: &str) -> bool {
    constant_time_eq::constant_time_eq(expected.as_bytes(), received.as_bytes())
}

/// Safe debug string for tokens (never logs the full token).
pub fn token_debug(token: &str) -> String {
    let hash = hex::encode(Sha256::digest(token.as_bytes()));
    let prefix: String = token.chars().take(6).collect();
    format!("len={}, prefix={}..., sha256_prefix={}", token.len(), prefix, &hash[..12])
}
