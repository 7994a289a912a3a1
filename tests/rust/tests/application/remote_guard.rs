//! Tests for remote endpoint ownership

use pretty_assertions::assert_eq;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use mcp_registry_core::registry::RegistryExtensions;
use mcp_registry_core::{RegistryError, ServerRecord, ServerRepository};
use mcp_registry_storage::InMemoryServerRepository;
use tests::fixtures::*;

const ENDPOINT: &str = "https://weather.example.com/mcp";

#[tokio::test]
async fn other_server_cannot_claim_endpoint() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    svc.publish(remote_server("com.example/weather", "1.0.0", ENDPOINT), &alice())
        .await
        .unwrap();
    let err = svc
        .publish(remote_server("com.other/weather", "1.0.0", ENDPOINT), &bob())
        .await
        .unwrap_err();

    match err {
        RegistryError::DuplicateRemoteUrl { url, owner } => {
            assert_eq!(url, ENDPOINT);
            assert_eq!(owner, "com.example/weather");
        }
        other => panic!("Expected DuplicateRemoteUrl, got {:?}", other),
    }
}

#[tokio::test]
async fn same_server_keeps_its_endpoint_across_versions() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    svc.publish(remote_server("com.example/weather", "1.0.0", ENDPOINT), &alice())
        .await
        .unwrap();
    let next = svc
        .publish(remote_server("com.example/weather", "1.1.0", ENDPOINT), &alice())
        .await
        .unwrap();

    assert!(next.is_latest());
}

#[tokio::test]
async fn guard_scans_past_the_first_page() {
    let repo = Arc::new(InMemoryServerRepository::new());
    let svc = service(repo.clone(), unlimited_config());

    // Seed more own versions than one scan page holds, then a foreign owner
    let own_id = Uuid::new_v4();
    for patch in 0..60 {
        let record = ServerRecord::new(
            remote_server("com.example/weather-eu", &format!("1.0.{}", patch), ENDPOINT),
            RegistryExtensions::new(own_id, Utc::now(), false),
        );
        repo.create_server(&record).await.unwrap();
    }
    let foreign = ServerRecord::new(
        remote_server("com.example/weather", "1.0.0", ENDPOINT),
        RegistryExtensions::new(Uuid::new_v4(), Utc::now(), true),
    );
    repo.create_server(&foreign).await.unwrap();

    let err = svc
        .publish(
            remote_server("com.example/weather-eu", "2.0.0", ENDPOINT),
            &alice(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::DuplicateRemoteUrl { ref owner, .. } if owner == "com.example/weather"
    ));
}
