use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while decoding the expiry claim out of a bearer token.
///
/// These never escape the expiry helpers below; any decode failure downgrades
/// the token to "expired" rather than "valid".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The token does not have the expected three dot-separated segments
    #[error("token is not a three-segment credential")]
    Malformed,

    /// The payload segment is not valid base64
    #[error("payload segment is not valid base64")]
    Base64,

    /// The decoded payload is not valid JSON
    #[error("payload is not valid JSON")]
    Json,

    /// The payload JSON has no numeric `exp` claim
    #[error("payload has no numeric exp claim")]
    MissingExp,

    /// The `exp` claim is not a representable timestamp
    #[error("exp claim is out of range")]
    InvalidTimestamp,
}

/// Decode the self-declared expiry claim out of an opaque bearer token.
///
/// The token is split on `.`, the middle segment base64url-decoded and parsed
/// as JSON, and the numeric `exp` field (seconds since epoch) extracted. The
/// signature segment is never checked; this is a client-side read of an
/// unverified claim, nothing more.
pub fn decode_expiry(token: &str) -> Result<DateTime<Utc>, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Malformed);
    }

    // Tolerate padded encoders; JWT payloads are canonically unpadded base64url.
    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| DecodeError::Base64)?;

    let claims: Value = serde_json::from_slice(&bytes).map_err(|_| DecodeError::Json)?;
    let exp = claims
        .get("exp")
        .and_then(Value::as_i64)
        .ok_or(DecodeError::MissingExp)?;

    DateTime::from_timestamp(exp, 0).ok_or(DecodeError::InvalidTimestamp)
}

/// Check whether a token is expired at the given instant.
///
/// A token that cannot be decoded is reported as expired, never as valid.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    match decode_expiry(token) {
        Ok(expiry) => expiry <= now,
        Err(e) => {
            debug!(error = %e, "failed to decode token expiry, treating as expired");
            true
        }
    }
}

/// Time remaining until the token expires, or `None` if it is already
/// expired or cannot be decoded.
pub fn time_until_expiry(token: &str, now: DateTime<Utc>) -> Option<Duration> {
    match decode_expiry(token) {
        Ok(expiry) if expiry > now => Some(expiry - now),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "failed to decode token expiry, treating as expired");
            None
        }
    }
}
