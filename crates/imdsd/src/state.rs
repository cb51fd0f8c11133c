// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::credential::store::CredentialReader;

/// Shared state for the metadata routes. Read-only by construction.
pub struct ImdsState {
    pub role_name: String,
    pub credentials: CredentialReader,
}

impl ImdsState {
    pub fn new(role_name: impl Into<String>, credentials: CredentialReader) -> Self {
        Self { role_name: role_name.into(), credentials }
    }
}
