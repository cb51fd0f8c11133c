// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the metadata routes.
//!
//! Uses `axum_test::TestServer` — no real TCP needed.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use tokio::time::Instant;

use imdsd::credential::store::CredentialStore;
use imdsd::credential::CredentialSet;
use imdsd::test_support::{epoch_2026, issued, test_state, TEST_ROLE_NAME};
use imdsd::transport::{build_router, CREDENTIALS_PATH};

fn test_server(store: &Arc<CredentialStore>) -> anyhow::Result<TestServer> {
    TestServer::new(build_router(test_state(store))).map_err(|e| anyhow::anyhow!("{e}"))
}

fn committed_store(n: u32) -> Arc<CredentialStore> {
    let store = CredentialStore::new();
    let set = CredentialSet::issued(issued(n), epoch_2026(), Duration::from_secs(1200));
    store.try_commit(set, Instant::now());
    store
}

#[tokio::test]
async fn root_redirects_to_listing() -> anyhow::Result<()> {
    let server = test_server(&CredentialStore::new())?;
    let resp = server.get("/").await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(resp.header("location"), CREDENTIALS_PATH);
    Ok(())
}

#[tokio::test]
async fn unmatched_paths_redirect_to_listing() -> anyhow::Result<()> {
    let server = test_server(&CredentialStore::new())?;
    for path in ["/latest/meta-data/", "/latest/meta-data/iam/security-credentials", "/nope"] {
        let resp = server.get(path).await;
        resp.assert_status(StatusCode::FOUND);
        assert_eq!(resp.header("location"), CREDENTIALS_PATH);
    }
    Ok(())
}

#[tokio::test]
async fn listing_returns_role_name_as_plain_text() -> anyhow::Result<()> {
    let server = test_server(&CredentialStore::new())?;
    let resp = server.get(CREDENTIALS_PATH).await;
    resp.assert_status_ok();
    resp.assert_text(TEST_ROLE_NAME);
    let content_type = resp.header("content-type");
    assert!(content_type.to_str()?.starts_with("text/plain"));
    Ok(())
}

#[tokio::test]
async fn listing_is_independent_of_cache_state() -> anyhow::Result<()> {
    let empty = test_server(&CredentialStore::new())?;
    let populated = test_server(&committed_store(1))?;
    assert_eq!(
        empty.get(CREDENTIALS_PATH).await.text(),
        populated.get(CREDENTIALS_PATH).await.text()
    );
    Ok(())
}

#[tokio::test]
async fn role_route_serves_cached_document() -> anyhow::Result<()> {
    let server = test_server(&committed_store(4))?;
    let resp = server.get(&format!("{CREDENTIALS_PATH}{TEST_ROLE_NAME}")).await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["Code"], "Success");
    assert_eq!(body["Type"], "AWS-HMAC");
    assert_eq!(body["AccessKeyId"], "ASIA000000000004");
    assert_eq!(body["SecretAccessKey"], "secret-4");
    assert_eq!(body["Token"], "token-4");
    assert_eq!(body["LastUpdated"], "2026-01-01T00:00:00Z");
    assert_eq!(body["Expiration"], "2026-01-01T00:20:00Z");
    Ok(())
}

#[tokio::test]
async fn role_route_reflects_later_commits() -> anyhow::Result<()> {
    let store = committed_store(1);
    let server = test_server(&store)?;
    let path = format!("{CREDENTIALS_PATH}{TEST_ROLE_NAME}");

    let before: CredentialSet = server.get(&path).await.json();
    assert_eq!(before.access_key_id, "ASIA000000000001");

    let next = CredentialSet::issued(issued(2), epoch_2026(), Duration::from_secs(1200));
    store.try_commit(next.clone(), Instant::now());

    let after: CredentialSet = server.get(&path).await.json();
    assert_eq!(after, next);
    Ok(())
}

#[tokio::test]
async fn empty_store_serves_failure_document() -> anyhow::Result<()> {
    let server = test_server(&CredentialStore::new())?;
    let resp = server.get(&format!("{CREDENTIALS_PATH}{TEST_ROLE_NAME}")).await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["Code"], "Failure");
    assert_eq!(body["AccessKeyId"], "");
    Ok(())
}

#[tokio::test]
async fn unknown_role_returns_404() -> anyhow::Result<()> {
    let server = test_server(&committed_store(1))?;
    let resp = server.get(&format!("{CREDENTIALS_PATH}some-other-role")).await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "ROLE_NOT_FOUND");
    Ok(())
}
