//! Hot reload of rotation settings on a running server.

use rotator_sdk::RotatorClient;
use std::time::Duration;

mod common;

const AT: &str = "2024-01-01T00:03:00Z";

async fn wait_for_bucket(client: &RotatorClient, expected: &str) -> bool {
    for _ in 0..50 {
        let current = client.current_address(Some(AT)).await.unwrap();
        if current.bucket == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_reload_changes_interval() {
    let server = common::start_server(common::test_config()).await;
    let client = RotatorClient::new(&server.url());

    let before = client.current_address(Some(AT)).await.unwrap();
    assert_eq!(before.bucket, "2024-01-01T00:00");
    assert_eq!(before.seconds_remaining, 120);

    let mut updated = common::test_config();
    updated.rotation.interval_minutes = 2;
    server.config_updates.send(updated).unwrap();

    assert!(wait_for_bucket(&client, "2024-01-01T00:02").await);
    let after = client.current_address(Some(AT)).await.unwrap();
    assert_eq!(after.seconds_remaining, 60);
    assert_ne!(after.address, before.address);
}

#[tokio::test]
async fn test_invalid_reload_keeps_service() {
    let server = common::start_server(common::test_config()).await;
    let client = RotatorClient::new(&server.url());
    let before = client.current_address(Some(AT)).await.unwrap();

    let mut bad = common::test_config();
    bad.rotation.operator_identity = "has whitespace".to_string();
    server.config_updates.send(bad).unwrap();

    // A valid change sent afterwards proves the bad one was consumed.
    let mut identity_change = common::test_config();
    identity_change.rotation.operator_identity = "treasury-eu".to_string();
    server.config_updates.send(identity_change).unwrap();

    let mut changed = false;
    for _ in 0..50 {
        let current = client.current_address(Some(AT)).await.unwrap();
        if current.address != before.address {
            assert_eq!(current.bucket, before.bucket);
            changed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(changed);

    let health: serde_json::Value = reqwest::get(format!("{}/health", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["operator_identity"], "treasury-eu");
}
