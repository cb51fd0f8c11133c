// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity provider backed by AWS STS.

use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_sdk_sts::config::Region;
use aws_sdk_sts::error::DisplayErrorContext;
use chrono::{DateTime, Utc};

use crate::credential::provider::{
    AssumeRoleRequest, IdentityProvider, IssuedCredentials, ProviderFuture,
};

/// STS is global; any region resolves it when the profile names none.
const FALLBACK_REGION: &str = "us-east-1";

/// Assumes roles with the long-lived credentials of a shared-config profile.
pub struct StsProvider {
    client: aws_sdk_sts::Client,
}

impl StsProvider {
    /// Load the named profile from the shared AWS config and credentials files.
    pub async fn from_profile(profile: &str) -> Self {
        let sdk = aws_config::defaults(BehaviorVersion::latest()).profile_name(profile).load().await;
        let mut config = aws_sdk_sts::config::Builder::from(&sdk);
        if sdk.region().is_none() {
            tracing::debug!(profile, region = FALLBACK_REGION, "profile has no region, using fallback");
            config = config.region(Region::new(FALLBACK_REGION));
        }
        Self { client: aws_sdk_sts::Client::from_conf(config.build()) }
    }
}

impl IdentityProvider for StsProvider {
    fn assume_role<'a>(
        &'a self,
        request: &'a AssumeRoleRequest,
    ) -> ProviderFuture<'a, IssuedCredentials> {
        Box::pin(async move {
            let duration = i32::try_from(request.duration.as_secs())
                .context("requested duration does not fit in an i32")?;
            let output = self
                .client
                .assume_role()
                .role_arn(&request.role_arn)
                .role_session_name(&request.session_name)
                .duration_seconds(duration)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("sts:AssumeRole: {}", DisplayErrorContext(&e)))?;

            let creds = output
                .credentials()
                .ok_or_else(|| anyhow::anyhow!("sts:AssumeRole returned no credentials"))?;

            Ok(IssuedCredentials {
                access_key_id: creds.access_key_id().to_owned(),
                secret_access_key: creds.secret_access_key().to_owned(),
                session_token: creds.session_token().to_owned(),
                expires_at: DateTime::<Utc>::from_timestamp(creds.expiration().secs(), 0),
            })
        })
    }

    fn caller_arn(&self) -> ProviderFuture<'_, String> {
        Box::pin(async move {
            let output = self
                .client
                .get_caller_identity()
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("sts:GetCallerIdentity: {}", DisplayErrorContext(&e)))?;
            output
                .arn()
                .map(str::to_owned)
                .ok_or_else(|| anyhow::anyhow!("sts:GetCallerIdentity returned no ARN"))
        })
    }
}
