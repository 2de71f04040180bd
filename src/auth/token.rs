use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::validator::Validator;

/// Random bytes behind each token
const TOKEN_BYTES: usize = 32;

/// Length of the base64url (unpadded) rendering of `TOKEN_BYTES`
pub const TOKEN_PLAINTEXT_LEN: usize = 43;

/// Purpose a token was issued for; a token is only accepted for its own scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenScope {
    Activation,
    Authentication,
    PasswordReset,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Activation => "activation",
            TokenScope::Authentication => "authentication",
            TokenScope::PasswordReset => "password-reset",
        }
    }
}

/// An issued token. Only the hash is ever stored; the plaintext is returned
/// to the client (or mailed) exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: Vec<u8>,
    #[serde(skip)]
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    #[serde(skip)]
    pub scope: TokenScope,
}

impl Token {
    pub fn generate(user_id: i64, ttl: Duration, scope: TokenScope) -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        let plaintext = URL_SAFE_NO_PAD.encode(bytes);
        let hash = hash_plaintext(&plaintext);

        Self {
            plaintext,
            hash,
            user_id,
            expiry: Utc::now() + ttl,
            scope,
        }
    }
}

/// SHA-256 of the plaintext, as stored and looked up
pub fn hash_plaintext(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

/// Cheap shape check done before any store lookup
pub fn is_well_formed(plaintext: &str) -> bool {
    plaintext.len() == TOKEN_PLAINTEXT_LEN
        && plaintext
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn validate_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(
        is_well_formed(plaintext),
        "token",
        "must be 43 url-safe characters long",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_well_formed_and_distinct() {
        let a = Token::generate(1, Duration::hours(24), TokenScope::Authentication);
        let b = Token::generate(1, Duration::hours(24), TokenScope::Authentication);

        assert_eq!(a.plaintext.len(), TOKEN_PLAINTEXT_LEN);
        assert!(is_well_formed(&a.plaintext));
        assert_ne!(a.plaintext, b.plaintext);
        assert_eq!(a.hash, hash_plaintext(&a.plaintext));
        assert_eq!(a.hash.len(), 32);
        assert!(a.expiry > Utc::now());
    }

    #[test]
    fn rejects_malformed_plaintext() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"a".repeat(44)));
        assert!(!is_well_formed(&format!("{}=", "a".repeat(42))));
        assert!(!is_well_formed(&format!("{} ", "a".repeat(42))));
        assert!(is_well_formed(&"aZ0-_".repeat(9)[..43]));
    }

    #[test]
    fn validator_reports_token_field() {
        let mut v = Validator::new();
        validate_plaintext(&mut v, "");
        assert_eq!(v.errors().get("token").unwrap(), "must be provided");
    }

    #[test]
    fn serializes_only_plaintext_and_expiry() {
        let token = Token::generate(7, Duration::minutes(45), TokenScope::PasswordReset);
        let value = serde_json::to_value(&token).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("token"));
        assert!(object.contains_key("expiry"));
    }
}
