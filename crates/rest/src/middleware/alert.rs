//! Alert header middleware.
//!
//! Handlers and errors attach an [`Alert`] to the response extensions. This
//! middleware turns it into `X-{app}-alert` / `X-{app}-error` and
//! `X-{app}-params` headers using the configured application name.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::responses::Alert;

/// Middleware function for alert headers.
///
/// This can be used with `axum::middleware::from_fn_with_state`, with the
/// application name as state.
pub async fn alert_middleware(
    State(app_name): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if let Some(alert) = response.extensions_mut().remove::<Alert>() {
        debug!(?alert, "Adding alert headers");
        let headers = alert.to_header_map(&app_name);
        response.headers_mut().extend(headers);
    }

    response
}
