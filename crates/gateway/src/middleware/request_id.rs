//! Request id propagation into error responses

use axum::{extract::Request, middleware::Next, response::Response};
use ideahub_common::errors::scope_request_id;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Scope the `x-request-id` set by the outer layer around the rest of the stack
pub async fn attach_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match request_id {
        Some(id) => scope_request_id(id, next.run(request)).await,
        None => next.run(request).await,
    }
}
