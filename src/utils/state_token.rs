//! Signed OAuth `state` parameter.
//!
//! The state binds the provider callback to the owner who initiated the link
//! without server-side session storage. Format:
//! `base64url(json payload) "." hex(hmac-sha256(payload))`, where the payload
//! carries the owner id and an issuance timestamp checked against a short TTL
//! on callback.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Callbacks older than this are rejected.
pub const STATE_TTL_SECS: i64 = 900;

// Tolerated clock skew between issuer and verifier.
const MAX_SKEW_SECS: i64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StateTokenError {
    #[error("malformed state token")]
    Malformed,
    #[error("state token signature mismatch")]
    BadSignature,
    #[error("state token expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatePayload {
    owner_id: Uuid,
    issued_at: i64,
}

fn mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length")
}

/// Signs a state token for `owner_id`, issued now.
pub fn sign(secret: &str, owner_id: Uuid) -> String {
    sign_at(secret, owner_id, Utc::now())
}

/// Signs a state token with an explicit issuance time. Exposed so expiry
/// behavior can be exercised in tests.
pub fn sign_at(secret: &str, owner_id: Uuid, issued_at: DateTime<Utc>) -> String {
    let payload = StatePayload {
        owner_id,
        issued_at: issued_at.timestamp(),
    };
    let bytes = serde_json::to_vec(&payload).expect("state payload serializes");
    let mut m = mac(secret);
    m.update(&bytes);
    let sig = m.finalize().into_bytes();
    format!("{}.{}", URL_SAFE_NO_PAD.encode(&bytes), hex::encode(sig))
}

/// Verifies signature and TTL, returning the owner id the token was issued for.
pub fn verify(secret: &str, token: &str) -> Result<Uuid, StateTokenError> {
    let (payload_b64, sig_hex) = token.split_once('.').ok_or(StateTokenError::Malformed)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| StateTokenError::Malformed)?;
    let sig = hex::decode(sig_hex).map_err(|_| StateTokenError::Malformed)?;

    let mut m = mac(secret);
    m.update(&bytes);
    m.verify_slice(&sig)
        .map_err(|_| StateTokenError::BadSignature)?;

    let payload: StatePayload =
        serde_json::from_slice(&bytes).map_err(|_| StateTokenError::Malformed)?;

    let age = Utc::now().timestamp() - payload.issued_at;
    if age > STATE_TTL_SECS || age < -MAX_SKEW_SECS {
        return Err(StateTokenError::Expired);
    }

    Ok(payload.owner_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "test-state-secret";

    #[test]
    fn test_sign_verify_roundtrip() {
        let owner = Uuid::new_v4();
        let token = sign(SECRET, owner);
        assert_eq!(verify(SECRET, &token).unwrap(), owner);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(verify(SECRET, "not-valid-base64"), Err(StateTokenError::Malformed));
        assert_eq!(verify(SECRET, ""), Err(StateTokenError::Malformed));
        assert_eq!(verify(SECRET, "abc.nothex!"), Err(StateTokenError::Malformed));
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let token = sign(SECRET, Uuid::new_v4());
        assert_eq!(verify("other-secret", &token), Err(StateTokenError::BadSignature));
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let token = sign(SECRET, Uuid::new_v4());
        let (_, sig) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&StatePayload {
                owner_id: Uuid::new_v4(),
                issued_at: Utc::now().timestamp(),
            })
            .unwrap(),
        );
        let forged = format!("{}.{}", forged_payload, sig);
        assert_eq!(verify(SECRET, &forged), Err(StateTokenError::BadSignature));
    }

    #[test]
    fn test_rejects_expired_token() {
        let owner = Uuid::new_v4();
        let issued = Utc::now() - Duration::seconds(STATE_TTL_SECS + 10);
        let token = sign_at(SECRET, owner, issued);
        assert_eq!(verify(SECRET, &token), Err(StateTokenError::Expired));
    }

    #[test]
    fn test_accepts_token_within_ttl() {
        let owner = Uuid::new_v4();
        let issued = Utc::now() - Duration::seconds(STATE_TTL_SECS - 60);
        let token = sign_at(SECRET, owner, issued);
        assert_eq!(verify(SECRET, &token).unwrap(), owner);
    }
}
