// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

use crate::credential::scheduler::RefreshPolicy;

/// Shortest and longest session the role-assumption API will issue.
const MIN_DURATION_SECS: u64 = 900;
const MAX_DURATION_SECS: u64 = 43_200;

/// Instance-metadata credential endpoint backed by a periodically assumed role.
#[derive(Debug, Clone, Parser)]
#[command(name = "imdsd", version, about)]
pub struct Config {
    /// ARN of the role to assume.
    #[arg(long, env = "IMDS_ROLE_ARN")]
    pub role_arn: String,

    /// Shared-config profile holding the identity that assumes the role.
    #[arg(long, env = "IMDS_SOURCE_PROFILE", default_value = "default")]
    pub source_profile: String,

    /// Host address to bind to.
    #[arg(long, env = "IMDS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP port to listen on.
    #[arg(long, env = "IMDS_PORT", default_value_t = 80)]
    pub port: u16,

    /// Role name advertised on the metadata listing route.
    #[arg(long, env = "IMDS_ROLE_NAME", default_value = "dummy-iamrole")]
    pub role_name: String,

    /// Validity window requested for each credential set, in seconds.
    #[arg(long, env = "IMDS_DURATION_SECS", default_value_t = 1200)]
    pub duration_secs: u64,

    /// Age in seconds after which cached credentials are refreshed.
    #[arg(long, env = "IMDS_UPDATABLE_SECS", default_value_t = 600)]
    pub updatable_secs: u64,

    /// Seconds between staleness checks.
    #[arg(long, env = "IMDS_CHECK_INTERVAL_SECS", default_value_t = 60)]
    pub check_interval_secs: u64,

    /// Timeout in seconds for a single identity provider call.
    #[arg(long, env = "IMDS_PROVIDER_TIMEOUT_SECS", default_value_t = 30)]
    pub provider_timeout_secs: u64,

    /// Session name used when the caller identity cannot be resolved.
    #[arg(long, env = "IMDS_DEFAULT_SESSION_NAME", default_value = "jhondoe")]
    pub default_session_name: String,

    /// Log format (json or text).
    #[arg(long, env = "IMDS_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "IMDS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Reject configurations the service cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.role_arn.trim().is_empty() {
            anyhow::bail!("--role-arn (IMDS_ROLE_ARN) is not set");
        }
        if self.source_profile.trim().is_empty() {
            anyhow::bail!("--source-profile must not be empty");
        }
        if self.role_name.is_empty() || self.role_name.contains('/') {
            anyhow::bail!("invalid role name: {:?}", self.role_name);
        }
        if self.default_session_name.trim().is_empty() {
            anyhow::bail!("--default-session-name must not be empty");
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration_secs) {
            anyhow::bail!(
                "--duration-secs must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS}, got {}",
                self.duration_secs
            );
        }
        if self.updatable_secs >= self.duration_secs {
            anyhow::bail!(
                "--updatable-secs ({}) must be less than --duration-secs ({})",
                self.updatable_secs,
                self.duration_secs
            );
        }
        if self.check_interval_secs == 0 {
            anyhow::bail!("--check-interval-secs must be greater than zero");
        }
        if self.provider_timeout_secs == 0 {
            anyhow::bail!("--provider-timeout-secs must be greater than zero");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            check_interval: Duration::from_secs(self.check_interval_secs),
            updatable_after: Duration::from_secs(self.updatable_secs),
            validity: Duration::from_secs(self.duration_secs),
            provider_timeout: self.provider_timeout(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
