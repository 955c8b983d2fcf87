use chrono::{DateTime, Utc};

use reelpipe_auth::JwtClaims;

/// When the request entered the pipeline.
///
/// Attached by the request-time middleware for every request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestTime(DateTime<Utc>);

impl RequestTime {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.0
    }

    /// Milliseconds since the Unix epoch.
    pub fn millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

/// Identity proven by a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    claims: JwtClaims,
}

impl AuthenticatedUser {
    pub fn new(claims: JwtClaims) -> Self {
        Self { claims }
    }

    pub fn username(&self) -> &str {
        self.claims.username()
    }
}
