// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;

use super::{imds_time, CredentialSet, CredentialStatus, CREDENTIAL_TYPE};
use crate::test_support::{epoch_2026, issued};

#[test]
fn issued_set_expires_after_validity_window() {
    let at = epoch_2026();
    let set = CredentialSet::issued(issued(1), at, Duration::from_secs(1200));

    assert_eq!(set.status, CredentialStatus::Success);
    assert_eq!(set.kind, CREDENTIAL_TYPE);
    assert_eq!(set.last_updated, at);
    assert_eq!(set.expiration, at + TimeDelta::seconds(1200));
    assert_eq!(set.access_key_id, "ASIA000000000001");
}

#[test]
fn issued_set_ignores_provider_reported_expiry() {
    let at = epoch_2026();
    let mut creds = issued(1);
    creds.expires_at = Some(at + TimeDelta::seconds(3600));
    let set = CredentialSet::issued(creds, at, Duration::from_secs(900));
    assert_eq!(set.expiration, at + TimeDelta::seconds(900));
}

#[test]
fn failure_set_is_empty_and_expired() {
    let at = epoch_2026();
    let set = CredentialSet::failure(at);
    assert!(!set.is_success());
    assert!(set.access_key_id.is_empty());
    assert!(set.secret_access_key.is_empty());
    assert!(set.session_token.is_empty());
    assert_eq!(set.expiration, at);
}

#[test]
fn empty_set_is_a_failure_at_unix_epoch() {
    let set = CredentialSet::empty();
    assert_eq!(set.status, CredentialStatus::Failure);
    assert_eq!(set.last_updated, DateTime::<Utc>::UNIX_EPOCH);
}

#[test]
fn document_uses_metadata_key_names() -> anyhow::Result<()> {
    let set = CredentialSet::issued(issued(7), epoch_2026(), Duration::from_secs(1200));
    let value = serde_json::to_value(&set)?;

    assert_eq!(
        value,
        serde_json::json!({
            "Code": "Success",
            "LastUpdated": "2026-01-01T00:00:00Z",
            "Type": "AWS-HMAC",
            "AccessKeyId": "ASIA000000000007",
            "SecretAccessKey": "secret-7",
            "Token": "token-7",
            "Expiration": "2026-01-01T00:20:00Z",
        })
    );
    Ok(())
}

#[test]
fn failure_document_reports_failure_code() -> anyhow::Result<()> {
    let value = serde_json::to_value(CredentialSet::empty())?;
    assert_eq!(value["Code"], "Failure");
    assert_eq!(value["LastUpdated"], "1970-01-01T00:00:00Z");
    assert_eq!(value["AccessKeyId"], "");
    Ok(())
}

#[test]
fn timestamps_drop_fractional_seconds() {
    let at = epoch_2026() + TimeDelta::milliseconds(1750);
    assert_eq!(imds_time::format(&at), "2026-01-01T00:00:01Z");
}

#[yare::parameterized(
    zulu          = { "2020-07-05T09:09:43Z" },
    offset        = { "2020-07-05T18:09:43+09:00" },
    fractional    = { "2020-07-05T09:09:43.250Z" },
)]
fn parses_timestamp_variants(raw: &str) {
    let parsed = imds_time::parse(raw).map(|ts| imds_time::format(&ts));
    assert_eq!(parsed.ok().as_deref(), Some("2020-07-05T09:09:43Z"));
}

#[test]
fn rejects_malformed_timestamp() {
    assert!(imds_time::parse("yesterday").is_err());
}

#[test]
fn debug_output_redacts_secrets() {
    let set = CredentialSet::issued(issued(3), epoch_2026(), Duration::from_secs(1200));
    let debug = format!("{set:?}");
    assert!(debug.contains("ASIA000000000003"));
    assert!(!debug.contains("secret-3"));
    assert!(!debug.contains("token-3"));
}

proptest! {
    #[test]
    fn document_round_trips(
        key in "[A-Z0-9]{0,20}",
        secret in ".{0,40}",
        token in ".{0,80}",
        secs in 0i64..4_102_444_800,
        validity in 1u64..43_200,
        success in any::<bool>(),
    ) {
        let at = DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default();
        let mut set = CredentialSet::issued(
            crate::credential::provider::IssuedCredentials {
                access_key_id: key,
                secret_access_key: secret,
                session_token: token,
                expires_at: None,
            },
            at,
            Duration::from_secs(validity),
        );
        if !success {
            set.status = CredentialStatus::Failure;
        }

        let json = serde_json::to_string(&set).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let back: CredentialSet =
            serde_json::from_str(&json).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(back, set);
    }
}
