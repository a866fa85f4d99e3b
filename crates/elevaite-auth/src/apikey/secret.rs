//! Generation, parsing and verification of API key strings.
//!
//! A key reads `ek_<apikey id, simple form>_<secret>`. The id lets the
//! server find the row without scanning; only an Argon2id hash of the
//! secret is stored.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use uuid::Uuid;

use elevaite_core::error::AppError;

/// Prefix of every key string.
const KEY_PREFIX: &str = "ek";
/// Random bytes per secret.
const SECRET_BYTES: usize = 32;

/// A freshly minted key. `plaintext` is shown to the creator once.
#[derive(Debug, Clone)]
pub struct GeneratedApikey {
    pub id: Uuid,
    pub plaintext: String,
    pub key_hash: String,
}

/// A key string split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApikeySecret {
    pub id: Uuid,
    secret: String,
}

impl ApikeySecret {
    /// Mint a new key for a row with the given id.
    pub fn generate(id: Uuid) -> Result<GeneratedApikey, AppError> {
        let bytes: [u8; SECRET_BYTES] = rand::random();
        let secret = URL_SAFE_NO_PAD.encode(bytes);
        let key_hash = hash_secret(&secret)?;
        Ok(GeneratedApikey {
            id,
            plaintext: format!("{KEY_PREFIX}_{}_{secret}", id.simple()),
            key_hash,
        })
    }

    /// Split a presented key string. Any malformed input is an authentication failure.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let invalid = || AppError::authentication("Invalid API key");
        let rest = raw
            .strip_prefix(KEY_PREFIX)
            .and_then(|r| r.strip_prefix('_'))
            .ok_or_else(invalid)?;
        let (id, secret) = rest.split_once('_').ok_or_else(invalid)?;
        let id = Uuid::try_parse(id).map_err(|_| invalid())?;
        if secret.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            id,
            secret: secret.to_string(),
        })
    }

    /// Check the secret against a stored hash.
    pub fn verify(&self, key_hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(key_hash)
            .map_err(|e| AppError::internal(format!("Invalid API key hash format: {e}")))?;
        match Argon2::default().verify_password(self.secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "API key verification failed: {e}"
            ))),
        }
    }
}

fn hash_secret(secret: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AppError::internal(format!("API key hashing failed: {e}")))?;
    Ok(hash.to_string())
}
