// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the metadata routes. None of them mutate state or wait
//! on a refresh.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::ImdsError;
use crate::state::ImdsState;
use crate::transport::CREDENTIALS_PATH;

/// `GET /` (and unmatched paths) — 302 to the role listing.
pub async fn redirect_to_listing() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, CREDENTIALS_PATH)])
}

/// `GET /latest/meta-data/iam/security-credentials/` — the advertised role name.
pub async fn role_listing(State(s): State<Arc<ImdsState>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], s.role_name.clone())
}

/// `GET /latest/meta-data/iam/security-credentials/{role}` — the cached
/// credential document.
pub async fn role_credentials(
    State(s): State<Arc<ImdsState>>,
    Path(role): Path<String>,
) -> Response {
    if role != s.role_name {
        return ImdsError::RoleNotFound
            .to_http_response(format!("unknown role: {role}"))
            .into_response();
    }

    let snapshot = s.credentials.read();
    match serde_json::to_vec(snapshot.as_ref()) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!(err = %e, "failed to encode credential document");
            ImdsError::Internal
                .to_http_response("failed to encode credential document")
                .into_response()
        }
    }
}
