//! Unverified JWT payload decoding.
//!
//! The client never holds the signing secret, so it only reads claims (expiry,
//! role) out of the access token to decide when a session is over. The server
//! remains the authority on whether a token is valid.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims read from the middle segment of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
    /// Subject (user identifier)
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Role claim, e.g. `ADMIN`
    #[serde(default)]
    pub role: Option<String>,
}

impl TokenPayload {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Seconds left before `exp`, negative once expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        self.exp.saturating_sub(now.timestamp())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) <= 0
    }
}

/// Decode the payload of `token` without checking its signature.
///
/// Returns `None` when the token has no payload segment, the segment is not
/// base64url, or the JSON does not carry an `exp` claim.
pub fn decode_payload(token: &str) -> Option<TokenPayload> {
    let segment = token.split('.').nth(1)?;
    // Accept both alphabets and optional padding.
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = match URL_SAFE_NO_PAD.decode(normalized) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Token payload is not base64url");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::debug!(error = %e, "Token payload is not a claims object");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    fn mint(claims: &serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"test-secret-key-for-testing"),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_signed_token() {
        let token = mint(&serde_json::json!({
            "sub": "42",
            "email": "admin@example.com",
            "role": "ADMIN",
            "iat": 1_700_000_000,
            "exp": 1_700_000_300,
        }));

        let payload = decode_payload(&token).unwrap();
        assert_eq!(payload.exp, 1_700_000_300);
        assert_eq!(payload.iat, Some(1_700_000_000));
        assert_eq!(payload.sub.as_deref(), Some("42"));
        assert_eq!(payload.role.as_deref(), Some("ADMIN"));
        assert_eq!(payload.name, None);
    }

    #[test]
    fn test_invalid_payload_segment_is_none() {
        assert_eq!(decode_payload("x.y.z"), None);
        assert_eq!(decode_payload("x.!!!.z"), None);
    }

    #[test]
    fn test_missing_segment_is_none() {
        assert_eq!(decode_payload("no-dots"), None);
        assert_eq!(decode_payload(""), None);
    }

    #[test]
    fn test_payload_without_exp_is_none() {
        let segment = URL_SAFE_NO_PAD.encode(br#"{"sub":"42"}"#);
        assert_eq!(decode_payload(&format!("h.{}.s", segment)), None);
    }

    #[test]
    fn test_padded_standard_alphabet_accepted() {
        let segment = base64::engine::general_purpose::STANDARD.encode(br#"{"exp":10,"x":"??>"}"#);
        let payload = decode_payload(&format!("h.{}.s", segment)).unwrap();
        assert_eq!(payload.exp, 10);
    }

    #[test]
    fn test_expiry_helpers() {
        let payload = TokenPayload {
            exp: 1_000,
            iat: None,
            sub: None,
            email: None,
            name: None,
            role: None,
        };
        let before = DateTime::from_timestamp(900, 0).unwrap();
        let after = DateTime::from_timestamp(1_000, 0).unwrap();

        assert_eq!(payload.remaining_secs(before), 100);
        assert!(!payload.is_expired_at(before));
        assert!(payload.is_expired_at(after));
        assert_eq!(payload.expires_at(), Some(after));
    }

    #[test]
    fn test_extreme_exp_saturates() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut payload = decode_payload(&format!(
            "h.{}.s",
            URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, i64::MIN))
        ))
        .unwrap();

        assert_eq!(payload.remaining_secs(now), i64::MIN);
        assert!(payload.is_expired_at(now));
        assert_eq!(payload.expires_at(), None);

        payload.exp = i64::MAX;
        assert_eq!(payload.remaining_secs(DateTime::from_timestamp(-1, 0).unwrap()), i64::MAX);
        assert!(!payload.is_expired_at(now));
    }
}

