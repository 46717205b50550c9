//! Connection token issuing
//!
//! The channel server authenticates subscribers with an HS256 JWT carrying
//! the subject identifier and an expiry. Tokens are issued per candidate
//! per session and are short-lived.

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::TransportError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the candidate/session identity
    sub: String,
    /// Expiry as Unix epoch seconds
    exp: u64,
}

/// Issue a signed connection token for the given subject
pub fn issue_connection_token(
    secret: &str,
    subject: &str,
    ttl_secs: u64,
) -> Result<String, TransportError> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| TransportError::Token(e.to_string()))?
        .as_secs();

    let claims = Claims {
        sub: subject.to_string(),
        exp: now + ttl_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TransportError::Token(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn test_token_roundtrip() {
        let token = issue_connection_token("secret", "cand_ada_12345678", 3600).unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, "cand_ada_12345678");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_connection_token("secret", "cand", 3600).unwrap();
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }
}
