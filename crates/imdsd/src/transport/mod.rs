// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the metadata credential routes.

pub mod http;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::ImdsState;

/// Base path of the security-credentials tree. The trailing slash is part of
/// the protocol: the listing lives here and each role sits directly below.
pub const CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials/";

/// Build the axum `Router` with the metadata routes.
///
/// Any path not matched below redirects to [`CREDENTIALS_PATH`].
pub fn build_router(state: Arc<ImdsState>) -> Router {
    Router::new()
        .route("/", get(http::redirect_to_listing))
        .route(CREDENTIALS_PATH, get(http::role_listing))
        .route(&format!("{CREDENTIALS_PATH}{{role}}"), get(http::role_credentials))
        .fallback(http::redirect_to_listing)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
