use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use reelpipe_movies::MovieId;
use reelpipe_pipeline::{HttpError, RequestContext};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MovieCreated {
    pub message: &'static str,
    pub id: MovieId,
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct MovieUpdated {
    pub message: String,
    pub location: String,
}

/// Decode the parsed request body; an absent body decodes from `{}`.
pub fn body_as<T: DeserializeOwned>(ctx: &RequestContext) -> Result<T, HttpError> {
    let value = ctx
        .body()
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
    serde_json::from_value(value).map_err(|e| HttpError::bad_request(format!("Malformed body: {e}")))
}
