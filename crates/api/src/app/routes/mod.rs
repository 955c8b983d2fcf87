pub mod auth;
pub mod movies;
pub mod system;
pub mod users;
