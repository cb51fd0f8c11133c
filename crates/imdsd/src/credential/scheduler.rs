// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staleness-driven refresh of the credential store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::credential::provider::{AssumeRoleRequest, IdentityProvider};
use crate::credential::store::CredentialStore;
use crate::credential::CredentialSet;

/// Timing knobs for the refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// How often the loop wakes to check staleness.
    pub check_interval: Duration,
    /// Age at which a cached set becomes eligible for refresh.
    pub updatable_after: Duration,
    /// Validity window requested for each issued set.
    pub validity: Duration,
    /// Upper bound on a single provider call.
    pub provider_timeout: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            updatable_after: Duration::from_secs(600),
            validity: Duration::from_secs(1200),
            provider_timeout: Duration::from_secs(30),
        }
    }
}

/// A point in time on both clocks the scheduler uses: monotonic for
/// staleness, wall for the timestamps written into documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub instant: Instant,
    pub utc: DateTime<Utc>,
}

impl Moment {
    pub fn now() -> Self {
        Self { instant: Instant::now(), utc: Utc::now() }
    }

    /// The same moment shifted forward by `by` on both clocks.
    pub fn after(&self, by: Duration) -> Self {
        let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
        Self {
            instant: self.instant + by,
            utc: self.utc.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

/// Result of a single scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cached set was younger than the threshold; no provider call.
    Fresh,
    /// A new set was committed.
    Refreshed,
    /// The provider call failed; the cache is unchanged.
    Failed,
}

/// Owns the write side of the store and the provider.
pub struct RefreshScheduler {
    store: Arc<CredentialStore>,
    provider: Arc<dyn IdentityProvider>,
    request: AssumeRoleRequest,
    policy: RefreshPolicy,
}

impl RefreshScheduler {
    pub fn new(
        store: Arc<CredentialStore>,
        provider: Arc<dyn IdentityProvider>,
        role_arn: impl Into<String>,
        session_name: impl Into<String>,
        policy: RefreshPolicy,
    ) -> Self {
        let request = AssumeRoleRequest {
            role_arn: role_arn.into(),
            session_name: session_name.into(),
            duration: policy.validity,
        };
        Self { store, provider, request, policy }
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    /// Populate the store once, unconditionally.
    pub async fn bootstrap(&self) -> RefreshOutcome {
        self.bootstrap_at(Moment::now()).await
    }

    /// [`bootstrap`](Self::bootstrap) at an explicit moment.
    ///
    /// Unlike [`tick_at`](Self::tick_at) this installs a failure result too,
    /// because there is no earlier good value to protect.
    pub async fn bootstrap_at(&self, at: Moment) -> RefreshOutcome {
        let candidate = self.fetch(at).await;
        let success = candidate.is_success();
        self.store.bootstrap(candidate, at.instant);
        if success {
            tracing::info!(role_arn = %self.request.role_arn, "initial credentials installed");
            RefreshOutcome::Refreshed
        } else {
            tracing::warn!(
                role_arn = %self.request.role_arn,
                "initial refresh failed; serving failure document until the next successful refresh"
            );
            RefreshOutcome::Failed
        }
    }

    /// One steady-state step: refresh if the cached set is stale, and commit
    /// the result only if it succeeded.
    pub async fn tick_at(&self, at: Moment) -> RefreshOutcome {
        if !self.store.is_stale(at.instant, self.policy.updatable_after) {
            return RefreshOutcome::Fresh;
        }
        let candidate = self.fetch(at).await;
        let expiration = candidate.expiration;
        if self.store.try_commit(candidate, at.instant) {
            tracing::info!(%expiration, "credentials refreshed");
            RefreshOutcome::Refreshed
        } else {
            tracing::debug!("keeping previously cached credentials");
            RefreshOutcome::Failed
        }
    }

    /// Call the provider, folding errors and timeouts into a failure set.
    async fn fetch(&self, at: Moment) -> CredentialSet {
        let timeout = self.policy.provider_timeout;
        let result =
            match tokio::time::timeout(timeout, self.provider.assume_role(&self.request)).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("assume role timed out after {timeout:?}")),
            };

        match result {
            Ok(issued) => {
                let reported = issued.expires_at;
                let set = CredentialSet::issued(issued, at.utc, self.policy.validity);
                if let Some(reported) = reported {
                    if reported < set.expiration {
                        tracing::warn!(
                            %reported,
                            computed = %set.expiration,
                            "provider reports an earlier expiry than requested"
                        );
                    }
                }
                tracing::debug!(access_key_id = %set.access_key_id, "assumed role");
                set
            }
            Err(e) => {
                tracing::warn!(
                    role_arn = %self.request.role_arn,
                    err = %format!("{e:#}"),
                    "credential refresh failed"
                );
                CredentialSet::failure(at.utc)
            }
        }
    }

    /// Tick until `shutdown` fires.
    ///
    /// A provider call in flight when shutdown fires is abandoned.
    pub async fn run(self, shutdown: CancellationToken) {
        let period = self.policy.check_interval;
        let mut timer = tokio::time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("abandoning in-flight refresh");
                    break;
                }
                _ = self.tick_at(Moment::now()) => {}
            }
        }
        tracing::debug!("refresh scheduler stopped");
    }

    /// Spawn [`run`](Self::run) onto the runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
