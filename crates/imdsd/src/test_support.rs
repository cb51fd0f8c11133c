// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a scripted identity provider and helpers.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::config::Config;
use crate::credential::provider::{
    AssumeRoleRequest, IdentityProvider, IssuedCredentials, ProviderFuture,
};
use crate::credential::store::CredentialStore;
use crate::state::ImdsState;

pub const TEST_ROLE_ARN: &str = "arn:aws:iam::123456789012:role/imds-test";
pub const TEST_CALLER_ARN: &str = "arn:aws:iam::123456789012:user/alice";
pub const TEST_ROLE_NAME: &str = "dummy-iamrole";

/// Credential material tagged with `n` in every field, so a reader can tell
/// whether all fields of a snapshot came from the same issue.
pub fn issued(n: u32) -> IssuedCredentials {
    IssuedCredentials {
        access_key_id: format!("ASIA{n:012}"),
        secret_access_key: format!("secret-{n}"),
        session_token: format!("token-{n}"),
        expires_at: None,
    }
}

/// 2026-01-01T00:00:00Z.
pub fn epoch_2026() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_767_225_600, 0).unwrap_or_default()
}

/// Identity provider whose behaviour tests flip at runtime.
///
/// Successful calls return [`issued`] with the 1-based call number.
pub struct FakeProvider {
    calls: AtomicU32,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    caller_arn: Mutex<Option<String>>,
    requests: Mutex<Vec<AssumeRoleRequest>>,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
            caller_arn: Mutex::new(Some(TEST_CALLER_ARN.to_owned())),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A provider that fails every call until told otherwise.
    pub fn failing() -> Arc<Self> {
        let provider = Self::new();
        provider.set_failing(true);
        provider
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent `assume_role` call by `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// `None` makes the caller identity query fail.
    pub fn set_caller_arn(&self, arn: Option<&str>) {
        *self.caller_arn.lock() = arn.map(str::to_owned);
    }

    /// Number of `assume_role` calls started so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<AssumeRoleRequest> {
        self.requests.lock().clone()
    }
}

impl IdentityProvider for FakeProvider {
    fn assume_role<'a>(
        &'a self,
        request: &'a AssumeRoleRequest,
    ) -> ProviderFuture<'a, IssuedCredentials> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.requests.lock().push(request.clone());
            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("simulated provider outage (call {n})");
            }
            Ok(issued(n))
        })
    }

    fn caller_arn(&self) -> ProviderFuture<'_, String> {
        Box::pin(async move {
            self.caller_arn
                .lock()
                .clone()
                .ok_or_else(|| anyhow::anyhow!("simulated identity query failure"))
        })
    }
}

/// Config parsed the way the binary parses it, listening on an ephemeral port.
pub fn test_config() -> anyhow::Result<Config> {
    use clap::Parser;
    Ok(Config::try_parse_from([
        "imdsd",
        "--role-arn",
        TEST_ROLE_ARN,
        "--host",
        "127.0.0.1",
        "--port",
        "0",
        "--role-name",
        TEST_ROLE_NAME,
    ])?)
}

/// Router state over `store` advertising [`TEST_ROLE_NAME`].
pub fn test_state(store: &Arc<CredentialStore>) -> Arc<ImdsState> {
    Arc::new(ImdsState::new(TEST_ROLE_NAME, store.reader()))
}

/// Assert that `$expr` is an `Err` whose message contains `$substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
