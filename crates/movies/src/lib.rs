//! Movies domain: records, input validation and the in-memory store.
//!
//! No HTTP here; the API maps [`reelpipe_core::DomainError`] to responses.

pub mod movie;
pub mod store;

pub use movie::{Movie, MovieId, MovieInput, NewMovie};
pub use store::MovieStore;
