use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims model.
///
/// Timestamps travel as the registered `iat`/`exp` claims (seconds since the
/// epoch) so tokens stay readable by any JWT library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the authenticated username.
    pub sub: String,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    pub fn username(&self) -> &str {
        &self.sub
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the claim time window against `now`.
///
/// Signature verification happens before this, in [`crate::token`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn claims_at(issued: DateTime<Utc>, ttl: Duration) -> JwtClaims {
        JwtClaims {
            sub: "a".to_string(),
            issued_at: issued,
            expires_at: issued + ttl,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn valid_inside_window() {
        let c = claims_at(t0(), Duration::hours(1));
        assert_eq!(validate_claims(&c, t0() + Duration::minutes(59)), Ok(()));
    }

    #[test]
    fn expired_at_boundary() {
        let c = claims_at(t0(), Duration::hours(1));
        assert_eq!(
            validate_claims(&c, t0() + Duration::hours(1)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn not_yet_valid_before_issue() {
        let c = claims_at(t0(), Duration::hours(1));
        assert_eq!(
            validate_claims(&c, t0() - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let c = claims_at(t0(), Duration::zero());
        assert_eq!(validate_claims(&c, t0()), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn serializes_registered_claim_names() {
        let c = claims_at(t0(), Duration::hours(1));
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["sub"], "a");
        assert_eq!(v["iat"], t0().timestamp());
        assert_eq!(v["exp"], t0().timestamp() + 3600);
    }
}
