use std::sync::Arc;

use reelpipe_auth::{Hs256Jwt, UserStore};
use reelpipe_movies::MovieStore;

use crate::config::ApiConfig;

/// Collaborators shared by every request, built once at startup.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub users: Arc<UserStore>,
    pub movies: Arc<MovieStore>,
    pub jwt: Arc<Hs256Jwt>,
}

impl AppServices {
    /// Empty user registry and the seeded movie list.
    pub fn new(config: &ApiConfig) -> Self {
        Self::with_stores(config, UserStore::new(), MovieStore::seeded())
    }

    pub fn with_stores(config: &ApiConfig, users: UserStore, movies: MovieStore) -> Self {
        Self {
            users: Arc::new(users),
            movies: Arc::new(movies),
            jwt: Arc::new(Hs256Jwt::with_ttl(
                config.jwt_secret.as_bytes(),
                config.token_ttl(),
            )),
        }
    }
}
