//! Demo users router: param hook plus verb-per-route handlers.

use axum::http::StatusCode;

use reelpipe_pipeline::{Flow, HandlerResult, RequestContext, RouteError, Router, reply};

const DEMO_USERS: [&str; 2] = ["Kyle", "Sally"];

/// The demo user selected by the `:id` param hook, if the index exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedUser(pub Option<&'static str>);

pub fn router() -> Result<Router, RouteError> {
    let mut router = Router::new();
    router
        .get("/", list)?
        .get("/:id", show)?
        .put("/:id", update)?
        .delete("/:id", remove)?;
    router.param("id", load_user);
    Ok(router)
}

fn load_user(ctx: &mut RequestContext) -> HandlerResult {
    let user = ctx
        .param("id")
        .and_then(|id| id.parse::<usize>().ok())
        .and_then(|index| DEMO_USERS.get(index).copied());
    ctx.insert(LoadedUser(user));
    Ok(Flow::Next)
}

fn list(ctx: &mut RequestContext) -> HandlerResult {
    tracing::info!(name = ?ctx.query_param("name"), "listing users");
    Ok(Flow::Respond(reply::text(StatusCode::OK, "User list")))
}

fn show(ctx: &mut RequestContext) -> HandlerResult {
    respond_for_user(ctx, "Get")
}

fn update(ctx: &mut RequestContext) -> HandlerResult {
    respond_for_user(ctx, "Update")
}

fn remove(ctx: &mut RequestContext) -> HandlerResult {
    respond_for_user(ctx, "Delete")
}

fn respond_for_user(ctx: &RequestContext, verb: &str) -> HandlerResult {
    tracing::debug!(user = ?ctx.get::<LoadedUser>(), "user route");
    let id = ctx.param("id").unwrap_or_default();
    Ok(Flow::Respond(reply::text(
        StatusCode::OK,
        format!("{verb} User With ID {id}"),
    )))
}
