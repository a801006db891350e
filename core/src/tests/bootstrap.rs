use std::sync::Arc;

use elusiv_demo_connection::LoopbackConnector;
use elusiv_demo_connection::loopback::LOOPBACK_ENDPOINT;
use elusiv_demo_keypair::Keypair;
use tempfile::TempDir;

use super::mock::{MockProvider, MockSdk, UnreachableConnector};
use crate::error::BootstrapError;
use crate::session::{Bootstrapper, KeySource};

fn with_keys(keys: KeySource, sdk: &Arc<MockSdk>) -> Bootstrapper {
    Bootstrapper::new(
        keys,
        Arc::new(LoopbackConnector::new(0)),
        Arc::new(MockProvider { sdk: sdk.clone() }),
    )
}

#[tokio::test]
async fn test_bootstrap_loads_keypair_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("id.json");
    let keypair = Keypair::new_random();
    keypair.write_new_file(&path).unwrap();

    let sdk = MockSdk::new(0);
    let session = with_keys(KeySource::File(path), &sdk)
        .bootstrap()
        .await
        .unwrap();

    assert_eq!(session.owner(), keypair.pubkey());
    assert_eq!(session.endpoint(), LOOPBACK_ENDPOINT);
}

#[tokio::test]
async fn test_bootstrap_uses_provided_keypair() {
    let keypair = Arc::new(Keypair::new_random());
    let sdk = MockSdk::new(0);
    let session = with_keys(KeySource::Provided(keypair.clone()), &sdk)
        .bootstrap()
        .await
        .unwrap();
    assert_eq!(session.owner(), keypair.pubkey());
}

#[tokio::test]
async fn test_bootstrap_missing_keypair_file() {
    let dir = TempDir::new().unwrap();
    let sdk = MockSdk::new(0);

    let err = with_keys(KeySource::File(dir.path().join("missing.json")), &sdk)
        .bootstrap()
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::Keypair(_)));
    assert!(sdk.calls().await.is_empty());
}

#[tokio::test]
async fn test_bootstrap_unreachable_endpoint() {
    let sdk = MockSdk::new(0);
    let err = Bootstrapper::new(
        KeySource::Ephemeral,
        Arc::new(UnreachableConnector),
        Arc::new(MockProvider { sdk: sdk.clone() }),
    )
    .bootstrap()
    .await
    .unwrap_err();

    assert!(matches!(err, BootstrapError::Connection(_)));
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_bootstrap_sdk_init_failure() {
    let sdk = MockSdk::new(0);
    sdk.fail_init();

    let err = with_keys(KeySource::Ephemeral, &sdk)
        .bootstrap()
        .await
        .unwrap_err();
    assert!(matches!(err, BootstrapError::Sdk(_)));
}
