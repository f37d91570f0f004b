//! Optional access-code check for the API.

use crate::config::AuthConfig;
use crate::server::AppContext;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeader,
};
use serde::Deserialize;

/// The `?code=` query parameter accepted in place of a bearer token.
#[derive(Debug, Default, Deserialize)]
pub struct AccessCodeQuery {
    pub code: Option<String>,
}

/// Check a presented code against the configuration.
pub fn check_access_code(
    auth_config: &AuthConfig,
    query_code: Option<&str>,
    bearer_token: Option<&str>,
) -> Result<(), (StatusCode, &'static str)> {
    if !auth_config.enabled {
        return Ok(());
    }

    let Some(expected) = auth_config.access_code.as_deref() else {
        return Err((StatusCode::FORBIDDEN, "Access code not configured"));
    };

    if query_code == Some(expected) || bearer_token == Some(expected) {
        return Ok(());
    }

    Err((StatusCode::FORBIDDEN, "Invalid access code"))
}

/// Middleware rejecting requests without the configured access code.
pub async fn access_code_middleware(
    State(ctx): State<AppContext>,
    Query(query): Query<AccessCodeQuery>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let bearer_token = bearer.map(|b| b.token().to_string());

    check_access_code(
        &ctx.config.auth,
        query.code.as_deref(),
        bearer_token.as_deref(),
    )?;

    Ok(next.run(request).await)
}
