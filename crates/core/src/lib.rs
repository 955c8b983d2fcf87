//! `reelpipe-core`: domain error model shared by the in-memory stores.
//!
//! This crate has no HTTP or storage concerns.

pub mod error;

pub use error::{DomainError, DomainResult};
