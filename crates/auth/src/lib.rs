//! `reelpipe-auth`: password hashing, signed tokens and the user registry.
//!
//! This crate is intentionally decoupled from HTTP.

pub mod claims;
pub mod password;
pub mod token;
pub mod user;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use password::{hash_password, verify_password};
pub use token::{Hs256Jwt, JwtIssuer, JwtValidator, TokenError, DEFAULT_TOKEN_TTL_SECS};
pub use user::{AuthError, User, UserStore};
