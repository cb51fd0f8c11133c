// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential lifecycle: the cached credential set, the store that holds it,
//! the identity provider that issues it, and the scheduler that refreshes it.

pub mod provider;
pub mod scheduler;
pub mod store;
pub mod sts;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::provider::IssuedCredentials;

/// Signing scheme advertised in every credential document.
pub const CREDENTIAL_TYPE: &str = "AWS-HMAC";

/// Outcome of the provider call that produced a [`CredentialSet`].
///
/// Serialized verbatim as the document's `Code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
    Success,
    Failure,
}

impl CredentialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
        }
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit cached by the store and served by the metadata routes.
///
/// Field names on the wire follow the instance-metadata credential document
/// that SDK credential providers poll.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    #[serde(rename = "Code")]
    pub status: CredentialStatus,
    #[serde(rename = "LastUpdated", with = "imds_time")]
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "Token")]
    pub session_token: String,
    #[serde(rename = "Expiration", with = "imds_time")]
    pub expiration: DateTime<Utc>,
}

impl CredentialSet {
    /// Placeholder held by a store that has never been populated.
    pub fn empty() -> Self {
        Self::failure(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// A failed refresh stamped at `at`. Carries no secret material and is
    /// already expired.
    pub fn failure(at: DateTime<Utc>) -> Self {
        Self {
            status: CredentialStatus::Failure,
            last_updated: at,
            kind: CREDENTIAL_TYPE.to_owned(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: String::new(),
            expiration: at,
        }
    }

    /// Build a successful set from issued material.
    ///
    /// The expiry is anchored to `at` plus the requested validity window, not
    /// to whatever the provider reported.
    pub fn issued(creds: IssuedCredentials, at: DateTime<Utc>, validity: Duration) -> Self {
        let window = TimeDelta::from_std(validity).unwrap_or(TimeDelta::MAX);
        Self {
            status: CredentialStatus::Success,
            last_updated: at,
            kind: CREDENTIAL_TYPE.to_owned(),
            access_key_id: creds.access_key_id,
            secret_access_key: creds.secret_access_key,
            session_token: creds.session_token,
            expiration: at.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CredentialStatus::Success
    }
}

// Secret material stays out of logs.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("status", &self.status)
            .field("last_updated", &self.last_updated)
            .field("kind", &self.kind)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Second-precision UTC timestamps with a literal `Z` suffix
/// (`2020-07-05T09:09:43Z`).
pub mod imds_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.format(FORMAT).to_string()
    }

    /// Parse the wire format, falling back to general RFC 3339 so documents
    /// produced with offsets or fractional seconds still load.
    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match NaiveDateTime::parse_from_str(s, FORMAT) {
            Ok(naive) => Ok(naive.and_utc()),
            Err(_) => DateTime::parse_from_rfc3339(s).map(|ts| ts.with_timezone(&Utc)),
        }
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
