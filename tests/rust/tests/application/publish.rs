//! Tests for RegistryService::publish
//!
//! Validates identity reuse, latest-version selection, version uniqueness,
//! the version ceiling, structural rejection and event emission.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use mcp_registry_core::domain::DomainEvent;
use mcp_registry_core::{PublishRequest, RegistryError, ServerFilter};
use mcp_registry_storage::InMemoryServerRepository;
use tests::events::{drain, type_names};
use tests::fixtures::*;

#[tokio::test]
async fn first_publish_mints_identity_and_is_latest() {
    tests::init_tracing();
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    let record = svc
        .publish(server("com.example/weather", "1.0.0"), &alice())
        .await
        .unwrap();

    assert!(record.is_latest());
    assert_eq!(record.registry.published_at, record.registry.updated_at);
    assert_eq!(record.registry.release_date, Some(record.registry.published_at));
    assert_eq!(record.published_by.as_deref(), Some("alice"));

    let fetched = svc.get_by_id(&record.id()).await.unwrap();
    assert_eq!(fetched, record);
}

#[tokio::test]
async fn later_versions_reuse_identity() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    let first = svc
        .publish(server("com.example/weather", "1.0.0"), &alice())
        .await
        .unwrap();
    let second = svc
        .publish(server("com.example/weather", "1.1.0"), &alice())
        .await
        .unwrap();
    let other = svc
        .publish(server("com.example/maps", "1.0.0"), &alice())
        .await
        .unwrap();

    assert_eq!(first.id(), second.id());
    assert_ne!(first.id(), other.id());
}

#[tokio::test]
async fn higher_semver_becomes_latest_and_demotes_previous() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    let v1 = svc
        .publish(server("com.example/weather", "1.0.0"), &alice())
        .await
        .unwrap();
    let v2 = svc
        .publish(server("com.example/weather", "2.0.0"), &alice())
        .await
        .unwrap();

    assert!(v2.is_latest());
    let v1_now = svc.get_version(&v1.id(), "1.0.0").await.unwrap();
    assert!(!v1_now.is_latest());
    assert!(v1_now.registry.updated_at >= v1.registry.updated_at);
    assert_eq!(v1_now.registry.published_at, v1.registry.published_at);

    assert_eq!(svc.get_by_id(&v1.id()).await.unwrap().version(), "2.0.0");
}

#[tokio::test]
async fn lower_semver_backfill_is_not_latest() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    svc.publish(server("com.example/weather", "2.0.0"), &alice())
        .await
        .unwrap();
    let backfill = svc
        .publish(server("com.example/weather", "1.5.0"), &alice())
        .await
        .unwrap();

    assert!(!backfill.is_latest());
    let latest = svc
        .list(
            &ServerFilter::by_name("com.example/weather").with_latest(true),
            None,
            0,
        )
        .await
        .unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest.items[0].version(), "2.0.0");
}

#[tokio::test]
async fn prerelease_orders_below_release() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    svc.publish(server("com.example/weather", "1.0.0"), &alice())
        .await
        .unwrap();
    let pre = svc
        .publish(server("com.example/weather", "1.0.0-rc.1"), &alice())
        .await
        .unwrap();

    assert!(!pre.is_latest());
}

#[tokio::test]
async fn semver_beats_non_semver_and_non_semver_orders_by_time() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    svc.publish(server("com.example/weather", "1.0.0"), &alice())
        .await
        .unwrap();
    let snapshot = svc
        .publish(server("com.example/weather", "snapshot"), &alice())
        .await
        .unwrap();
    assert!(!snapshot.is_latest());

    svc.publish(server("com.example/nightly", "alpha"), &alice())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let beta = svc
        .publish(server("com.example/nightly", "beta"), &alice())
        .await
        .unwrap();
    assert!(beta.is_latest());
}

#[tokio::test]
async fn duplicate_version_is_rejected() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    svc.publish(server("com.example/weather", "1.0.0"), &alice())
        .await
        .unwrap();
    let err = svc
        .publish(server("com.example/weather", "1.0.0"), &alice())
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::InvalidVersion(_)), "{err:?}");
    assert_eq!(err.code(), "invalid_version");
}

#[tokio::test]
async fn version_ceiling_is_enforced() {
    let config = unlimited_config().with_max_versions_per_server(2);
    let svc = service(Arc::new(InMemoryServerRepository::new()), config);

    svc.publish(server("com.example/weather", "1.0.0"), &alice())
        .await
        .unwrap();
    svc.publish(server("com.example/weather", "1.0.1"), &alice())
        .await
        .unwrap();
    let err = svc
        .publish(server("com.example/weather", "1.0.2"), &alice())
        .await
        .unwrap_err();

    match err {
        RegistryError::MaxVersionsReached { name, max } => {
            assert_eq!(name, "com.example/weather");
            assert_eq!(max, 2);
        }
        other => panic!("Expected MaxVersionsReached, got {:?}", other),
    }

    // Other servers are unaffected
    assert!(svc
        .publish(server("com.example/maps", "1.0.0"), &alice())
        .await
        .is_ok());
}

#[tokio::test]
async fn malformed_manifests_are_invalid_input() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    let no_namespace = svc
        .publish(server("weather", "1.0.0"), &alice())
        .await
        .unwrap_err();
    assert!(matches!(no_namespace, RegistryError::InvalidInput(_)));

    let no_repository = svc
        .publish(
            mcp_registry_core::registry::ServerJson::new("com.example/weather", "1.0.0"),
            &alice(),
        )
        .await
        .unwrap_err();
    assert!(matches!(no_repository, RegistryError::InvalidInput(_)));

    let range = svc
        .publish(server("com.example/weather", "^1.0.0"), &alice())
        .await
        .unwrap_err();
    assert!(matches!(range, RegistryError::ValidationFailed(_)));
}

#[tokio::test]
async fn oversized_publisher_extensions_are_rejected() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    let mut big = serde_json::Map::new();
    big.insert("blob".into(), serde_json::Value::String("x".repeat(8192)));
    let err = svc
        .publish(
            PublishRequest::new(server("com.example/weather", "1.0.0"))
                .with_publisher_extensions(big),
            &alice(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidInput(_)));

    let mut small = serde_json::Map::new();
    small.insert("tier".into(), serde_json::json!("gold"));
    let record = svc
        .publish(
            PublishRequest::new(server("com.example/weather", "1.0.0"))
                .with_publisher_extensions(small.clone()),
            &alice(),
        )
        .await
        .unwrap();
    assert_eq!(record.publisher_extensions, small);
}

#[tokio::test]
async fn publish_emits_events() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());
    let mut rx = svc.subscribe();

    let v1 = svc
        .publish(server("com.example/weather", "1.0.0"), &alice())
        .await
        .unwrap();
    svc.publish(server("com.example/weather", "0.9.0"), &alice())
        .await
        .unwrap();
    svc.publish(server("com.example/weather", "2.0.0"), &alice())
        .await
        .unwrap();

    let events = drain(&mut rx);
    assert_eq!(
        type_names(&events),
        vec![
            "server_published",
            "latest_version_changed",
            "server_published",
            "server_published",
            "latest_version_changed",
        ]
    );

    match &events[4] {
        DomainEvent::LatestVersionChanged {
            server_id,
            previous_version,
            current_version,
            ..
        } => {
            assert_eq!(*server_id, v1.id());
            assert_eq!(previous_version.as_deref(), Some("1.0.0"));
            assert_eq!(current_version, "2.0.0");
        }
        other => panic!("Expected LatestVersionChanged, got {:?}", other),
    }
}

#[tokio::test]
async fn list_versions_returns_every_version() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    for version in ["1.0.0", "1.1.0", "0.1.0"] {
        svc.publish(server("com.example/weather", version), &alice())
            .await
            .unwrap();
    }

    let versions: Vec<String> = svc
        .list_versions("com.example/weather")
        .await
        .unwrap()
        .iter()
        .map(|r| r.version().to_string())
        .collect();
    assert_eq!(versions, vec!["1.0.0", "1.1.0", "0.1.0"]);

    assert!(matches!(
        svc.list_versions("com.example/missing").await,
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn get_by_unknown_id_is_not_found() {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());

    let err = svc.get_by_id(&uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
    assert!(err.is_client_error());
}
