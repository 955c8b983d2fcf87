use std::sync::{PoisonError, RwLock};

use reelpipe_core::{DomainError, DomainResult};

use crate::movie::{Movie, MovieId, NewMovie};

/// First id handed out by an empty store.
const FIRST_ID: u64 = 101;

/// In-memory movie list, injected into the API at construction time.
///
/// The lock only makes shared mutation sound; there are no cross-request
/// transactions.
#[derive(Debug, Default)]
pub struct MovieStore {
    inner: RwLock<Vec<Movie>>,
}

impl MovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movies(movies: Vec<Movie>) -> Self {
        Self {
            inner: RwLock::new(movies),
        }
    }

    /// The four demo movies (ids 101..=104).
    pub fn seeded() -> Self {
        let seed = [
            (101, "Fight Club", 1999, 8.1),
            (102, "Inception", 2010, 8.7),
            (103, "The Dark Knight", 2008, 9.0),
            (104, "12 Angry Men", 1957, 8.9),
        ];
        Self::with_movies(
            seed.into_iter()
                .map(|(id, name, year, rating)| Movie {
                    id: MovieId(id),
                    name: name.to_string(),
                    year,
                    rating,
                })
                .collect(),
        )
    }

    pub fn list(&self) -> Vec<Movie> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: MovieId) -> DomainResult<Movie> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    /// Append a movie with the next id (highest existing id + 1).
    pub fn create(&self, new: NewMovie) -> DomainResult<Movie> {
        let mut movies = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = movies
            .iter()
            .map(|m| m.id.get())
            .max()
            .map_or(FIRST_ID, |max| max + 1);

        let movie = Movie {
            id: MovieId(id),
            name: new.name,
            year: new.year,
            rating: new.rating,
        };
        movies.push(movie.clone());
        tracing::debug!(id, "movie created");
        Ok(movie)
    }

    pub fn update(&self, id: MovieId, new: NewMovie) -> DomainResult<Movie> {
        let mut movies = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let found = movies
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DomainError::NotFound)?;

        found.name = new.name;
        found.year = new.year;
        found.rating = new.rating;
        Ok(found.clone())
    }

    pub fn remove(&self, id: MovieId) -> DomainResult<Movie> {
        let mut movies = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let index = movies
            .iter()
            .position(|m| m.id == id)
            .ok_or(DomainError::NotFound)?;
        Ok(movies.remove(index))
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
