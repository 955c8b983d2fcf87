use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode, header};

use reelpipe_core::DomainError;
use reelpipe_movies::{MovieId, MovieInput, MovieStore, NewMovie};
use reelpipe_pipeline::{Flow, Handler, HttpError, RequestContext, RouteError, Router, handler_fn, reply};

use crate::app::dto::{MovieCreated, MovieUpdated};
use crate::app::errors::json_error_handler;
use crate::middleware;

const NOT_FOUND: &str = "Not found the movie";
const MISSING_DATA: &str = "Bad Request - missing some data!!!";
const INVALID_UPDATE: &str = "Bad Request - name, year and rating are required.";

/// Movies sub-router, mounted at `/movies`.
///
/// Carries its own timing middleware and error handler, so movie errors
/// never reach the global handler.
pub fn router(store: Arc<MovieStore>) -> Result<Router, RouteError> {
    let mut router = Router::new();
    router.use_middleware(middleware::log_time);

    router
        .get("/", list(store.clone()))?
        .get("/:id", show(store.clone()))?
        .post("/", create(store.clone()))?
        .put("/:id", update(store.clone()))?
        .delete("/:id", remove(store))?;

    router.catch(json_error_handler("movies"));
    Ok(router)
}

fn list(store: Arc<MovieStore>) -> impl Handler {
    handler_fn(move |_ctx| Ok(Flow::Respond(reply::json(StatusCode::OK, &store.list())?)))
}

fn show(store: Arc<MovieStore>) -> impl Handler {
    handler_fn(move |ctx| {
        let id = movie_id(ctx).ok_or_else(|| HttpError::not_found(NOT_FOUND))?;
        let movie = store.get(id).map_err(|_| HttpError::not_found(NOT_FOUND))?;
        Ok(Flow::Respond(reply::json(StatusCode::OK, &movie)?))
    })
}

fn create(store: Arc<MovieStore>) -> impl Handler {
    handler_fn(move |ctx| {
        let new = movie_input(ctx).map_err(|e| {
            tracing::debug!(error = %e, "rejecting movie");
            HttpError::bad_request(MISSING_DATA)
        })?;
        let movie = store.create(new).map_err(domain_fault)?;

        let location = format!("{}/{}", ctx.base_path(), movie.id);
        tracing::info!(id = %movie.id, name = %movie.name, "movie created");

        let mut res = reply::json(
            StatusCode::CREATED,
            &MovieCreated {
                message: "New movie created.",
                id: movie.id,
                location: location.clone(),
            },
        )?;
        if let Ok(value) = HeaderValue::from_str(&location) {
            res.headers_mut().insert(header::LOCATION, value);
        }
        Ok(Flow::Respond(res))
    })
}

fn update(store: Arc<MovieStore>) -> impl Handler {
    handler_fn(move |ctx| {
        let id = movie_id(ctx).ok_or_else(|| HttpError::bad_request(INVALID_UPDATE))?;
        let new = movie_input(ctx).map_err(|_| HttpError::bad_request(INVALID_UPDATE))?;

        let movie = store.update(id, new).map_err(|e| match e {
            DomainError::NotFound => HttpError::not_found(NOT_FOUND),
            other => domain_fault(other),
        })?;

        Ok(Flow::Respond(reply::json(
            StatusCode::OK,
            &MovieUpdated {
                message: format!("Movie id {} updated.", movie.id),
                location: format!("{}/{}", ctx.base_path(), movie.id),
            },
        )?))
    })
}

fn remove(store: Arc<MovieStore>) -> impl Handler {
    handler_fn(move |ctx| {
        let id = movie_id(ctx).ok_or_else(|| HttpError::not_found(NOT_FOUND))?;
        let movie = store.remove(id).map_err(|_| HttpError::not_found(NOT_FOUND))?;
        tracing::info!(id = %movie.id, "movie removed");
        Ok(Flow::Respond(reply::message(
            StatusCode::OK,
            format!("Movie id {} removed.", movie.id),
        )))
    })
}

fn movie_id(ctx: &RequestContext) -> Option<MovieId> {
    ctx.param("id")?.parse().ok()
}

fn movie_input(ctx: &RequestContext) -> Result<NewMovie, DomainError> {
    match ctx.body() {
        Some(body) => MovieInput::from_json(body)?.validate(),
        None => MovieInput::default().validate(),
    }
}

fn domain_fault(err: DomainError) -> HttpError {
    HttpError::internal(format!("movie store failure: {err}"))
}
