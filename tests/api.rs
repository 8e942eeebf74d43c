//! End-to-end tests of the HTTP API over a real socket.

use deposit_rotator::rotation::{AddressRotationService, TimeBucket};
use rotator_sdk::{ClientError, RotatorClient};

mod common;

fn expected_address(bucket: &str) -> String {
    let service = AddressRotationService::from_parts(common::IDENTITY, 5).unwrap();
    service
        .derive_for_bucket(&TimeBucket::parse(bucket).unwrap())
        .to_string()
}

#[tokio::test]
async fn test_reference_scenario() {
    let server = common::start_server(common::test_config()).await;
    let client = RotatorClient::new(&server.url());

    let first = client.current_address(Some("2024-01-01T00:03:00Z")).await.unwrap();
    assert_eq!(first.bucket, "2024-01-01T00:00");
    assert_eq!(first.seconds_remaining, 120);
    assert!(first.address.eq_ignore_ascii_case(&expected_address("2024-01-01T00:00")));

    let second = client.current_address(Some("2024-01-01T00:07:30Z")).await.unwrap();
    assert_eq!(second.bucket, "2024-01-01T00:05");
    assert_eq!(second.seconds_remaining, 90);
    assert!(second.address.eq_ignore_ascii_case(&expected_address("2024-01-01T00:05")));
    assert_ne!(first.address, second.address);
}

#[tokio::test]
async fn test_next_is_following_bucket() {
    let server = common::start_server(common::test_config()).await;
    let client = RotatorClient::new(&server.url());

    let next = client.next_address(Some("2024-01-01T00:03:00Z")).await.unwrap();
    assert_eq!(next.bucket, "2024-01-01T00:05");
    assert!(next.address.eq_ignore_ascii_case(&expected_address("2024-01-01T00:05")));

    let current = client.current_address(Some("2024-01-01T00:05:00Z")).await.unwrap();
    assert_eq!(current.address, next.address);
}

#[tokio::test]
async fn test_range_matches_current_addresses() {
    let server = common::start_server(common::test_config()).await;
    let client = RotatorClient::new(&server.url());

    let range = client
        .range("2024-01-01T00:00:00Z", "2024-01-01T00:22:00Z", None)
        .await
        .unwrap();
    // ceil(22 / 5)
    assert_eq!(range.count, 5);
    assert_eq!(range.entries.len(), 5);
    assert_eq!(range.interval_minutes, 5);
    assert_eq!(range.entries[4].bucket, "2024-01-01T00:20");

    for entry in &range.entries {
        let current = client.current_address(Some(&entry.boundary)).await.unwrap();
        assert_eq!(current.address, entry.address);
    }

    let again = client
        .range("2024-01-01T00:00:00Z", "2024-01-01T00:22:00Z", None)
        .await
        .unwrap();
    let addresses: Vec<_> = again.entries.iter().map(|e| &e.address).collect();
    assert_eq!(addresses, range.entries.iter().map(|e| &e.address).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_range_edge_cases() {
    let server = common::start_server(common::test_config()).await;
    let client = RotatorClient::new(&server.url());

    let empty = client
        .range("2024-01-01T01:00:00Z", "2024-01-01T00:00:00Z", None)
        .await
        .unwrap();
    assert_eq!(empty.count, 0);

    let hourly = client
        .range("2024-01-01T00:00:00Z", "2024-01-01T03:00:00Z", Some(60))
        .await
        .unwrap();
    assert_eq!(hourly.count, 3);
    assert_eq!(hourly.interval_minutes, 60);

    match client
        .range("2024-01-01T00:00:00Z", "2024-01-01T03:00:00Z", Some(0))
        .await
    {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("Invalid rotation interval"));
        }
        other => panic!("expected 400, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validate() {
    let server = common::start_server(common::test_config()).await;
    let client = RotatorClient::new(&server.url());

    let address = expected_address("2024-01-01T00:00");
    assert!(client.validate(&address, "2024-01-01T00:00").await.unwrap());
    assert!(client.validate(&address.to_lowercase(), "2024-01-01T00:00").await.unwrap());
    assert!(!client.validate(&address, "2024-01-01T00:05").await.unwrap());
    assert!(!client.validate("not-an-address", "2024-01-01T00:00").await.unwrap());

    match client.validate(&address, "2024-01-01 00:00").await {
        Err(ClientError::Api { status, .. }) => assert_eq!(status, 400),
        other => panic!("expected 400, got {:?}", other),
    }
}

#[tokio::test]
async fn test_status_disabled_is_explicit() {
    let server = common::start_server(common::test_config()).await;
    let client = RotatorClient::new(&server.url());

    match client
        .status("0x0000000000000000000000000000000000000001", None)
        .await
    {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 501);
            assert!(message.contains("not implemented"));
        }
        other => panic!("expected 501, got {:?}", other),
    }
}

#[tokio::test]
async fn test_health_connectors_and_request_id() {
    let server = common::start_server(common::test_config()).await;
    let http = reqwest::Client::new();

    let res = http.get(format!("{}/health", server.url())).send().await.unwrap();
    assert!(res.status().is_success());
    assert!(res.headers().contains_key("x-request-id"));
    let health: serde_json::Value = res.json().await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["interval_minutes"], 5);

    let res = http
        .get(format!("{}/health", server.url()))
        .header("x-request-id", "caller-supplied")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "caller-supplied");

    let connectors: serde_json::Value = http
        .get(format!("{}/api/v1/connectors", server.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let families = connectors.as_array().unwrap();
    assert_eq!(families.len(), 3);
    assert!(families.iter().all(|c| c["available"] == false));
}
