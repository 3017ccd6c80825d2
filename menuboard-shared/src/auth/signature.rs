/// Webhook payload signatures
///
/// The payment provider signs each notification body with HMAC-SHA256 using
/// the shared `BILLING_WEBHOOK_SECRET` and sends the hex digest in the
/// `X-Signature` header.
///
/// # Example
///
/// ```
/// use menuboard_shared::auth::signature::{sign, verify};
///
/// let body = br#"{"provider_reference":"mb_00","status":"succeeded"}"#;
/// let sig = sign("webhook-secret-at-least-32-bytes-long", body);
/// assert!(verify("webhook-secret-at-least-32-bytes-long", body, &sig).is_ok());
/// ```

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing signature")]
    Missing,

    #[error("Signature is not valid hex")]
    Malformed,

    #[error("Signature does not match payload")]
    Mismatch,
}

fn mac(secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length; new_from_slice never fails for it
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC key of any size is valid"),
    }
}

/// Hex-encoded HMAC-SHA256 of `body`
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = mac(secret);
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a hex signature against `body` in constant time
///
/// Surrounding whitespace and a `sha256=` prefix are tolerated.
pub fn verify(secret: &str, body: &[u8], signature: &str) -> Result<(), SignatureError> {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);

    if signature.is_empty() {
        return Err(SignatureError::Missing);
    }

    let expected = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;

    let mut mac = mac(secret);
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "billing-webhook-secret-32-bytes-min";

    #[test]
    fn test_sign_is_deterministic_hex() {
        let a = sign(SECRET, b"payload");
        let b = sign(SECRET, b"payload");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, sign(SECRET, b"payload2"));
        assert_ne!(a, sign("another-secret-of-sufficient-size", b"payload"));
    }

    #[test]
    fn test_verify() {
        let body = br#"{"provider_reference":"mb_1","status":"succeeded"}"#;
        let sig = sign(SECRET, body);

        assert_eq!(verify(SECRET, body, &sig), Ok(()));
        assert_eq!(verify(SECRET, body, &format!("sha256={}", sig)), Ok(()));
        assert_eq!(verify(SECRET, body, &sig.to_uppercase()), Ok(()));
    }

    #[test]
    fn test_verify_rejects() {
        let body = b"{}";
        let sig = sign(SECRET, body);

        assert_eq!(verify(SECRET, b"{ }", &sig), Err(SignatureError::Mismatch));
        assert_eq!(verify("wrong-secret", body, &sig), Err(SignatureError::Mismatch));
        assert_eq!(verify(SECRET, body, "zz"), Err(SignatureError::Malformed));
        assert_eq!(verify(SECRET, body, "  "), Err(SignatureError::Missing));
        assert_eq!(verify(SECRET, body, &sig[..10]), Err(SignatureError::Mismatch));
    }
}
