// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity provider boundary: trades a role identifier for short-lived
//! credential material.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Boxed future returned by [`IdentityProvider`] methods.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Parameters for a single role assumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub duration: Duration,
}

/// Credential material returned by a successful role assumption.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Expiry as reported by the provider, when it reports one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for IssuedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Source of short-lived credentials.
///
/// Object-safe for use as `Arc<dyn IdentityProvider>`.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Assume `request.role_arn` and return fresh credential material.
    fn assume_role<'a>(
        &'a self,
        request: &'a AssumeRoleRequest,
    ) -> ProviderFuture<'a, IssuedCredentials>;

    /// ARN of the identity the provider itself is authenticated as.
    fn caller_arn(&self) -> ProviderFuture<'_, String>;
}

/// Longest session name the role-assumption API accepts.
const MAX_SESSION_NAME_LEN: usize = 64;

/// Derive a session name from a caller ARN: the final `/`-separated segment
/// (`arn:aws:iam::123456789012:user/alice` -> `alice`), restricted to the
/// characters a session name may carry.
///
/// Returns `None` for ARNs without a path (account root) or when nothing
/// usable remains.
pub fn session_name_from_arn(arn: &str) -> Option<String> {
    let (_, tail) = arn.rsplit_once('/')?;
    let name: String = tail
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "_+=,.@-".contains(*c))
        .take(MAX_SESSION_NAME_LEN)
        .collect();
    if name.len() < 2 {
        None
    } else {
        Some(name)
    }
}

/// Ask the provider who it is and turn the answer into a session name.
///
/// Never fails: a query error, timeout, or unusable ARN yields `fallback`.
pub async fn resolve_session_name(
    provider: &dyn IdentityProvider,
    fallback: &str,
    timeout: Duration,
) -> String {
    let arn = match tokio::time::timeout(timeout, provider.caller_arn()).await {
        Ok(Ok(arn)) => arn,
        Ok(Err(e)) => {
            tracing::warn!(err = %format!("{e:#}"), fallback, "caller identity query failed");
            return fallback.to_owned();
        }
        Err(_) => {
            tracing::warn!(?timeout, fallback, "caller identity query timed out");
            return fallback.to_owned();
        }
    };

    match session_name_from_arn(&arn) {
        Some(name) => {
            tracing::info!(session_name = %name, "resolved session name from caller identity");
            name
        }
        None => {
            tracing::warn!(%arn, fallback, "caller ARN yielded no usable session name");
            fallback.to_owned()
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
