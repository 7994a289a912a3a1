//! Tests for RegistryService::list and the cursor protocol

use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;

use mcp_registry_core::config::RegistryConfig;
use mcp_registry_core::{RegistryError, RegistryService, ServerFilter};
use mcp_registry_storage::InMemoryServerRepository;
use tests::fixtures::*;

async fn seeded() -> RegistryService {
    let svc = service(Arc::new(InMemoryServerRepository::new()), unlimited_config());
    for (name, version) in [
        ("com.example/weather", "1.0.0"),
        ("com.example/maps", "1.0.0"),
        ("com.example/weather", "1.1.0"),
        ("io.github.someone/Weather-Tools", "0.1.0"),
        ("com.example/maps", "2.0.0"),
    ] {
        svc.publish(server(name, version), &alice()).await.unwrap();
    }
    svc
}

#[tokio::test]
async fn limit_one_walks_every_record_exactly_once() {
    let svc = seeded().await;

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;
    loop {
        let page = svc
            .list(&ServerFilter::new(), cursor.as_deref(), 1)
            .await
            .unwrap();
        pages += 1;
        seen.extend(
            page.items
                .iter()
                .map(|r| format!("{}@{}", r.name(), r.version())),
        );
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(seen.len(), 5);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 5);
    // Five full pages then one empty page
    assert_eq!(pages, 6);
    assert_eq!(seen[0], "com.example/weather@1.0.0");
}

#[tokio::test]
async fn cursor_is_stable_under_concurrent_inserts() {
    let svc = seeded().await;

    let first = svc.list(&ServerFilter::new(), None, 2).await.unwrap();
    svc.publish(server("com.example/late", "1.0.0"), &alice())
        .await
        .unwrap();
    let rest = svc
        .list(&ServerFilter::new(), first.next_cursor.as_deref(), 100)
        .await
        .unwrap();

    let names: Vec<_> = rest.items.iter().map(|r| r.name().to_string()).collect();
    assert_eq!(names.len(), 4);
    assert_eq!(names.last().map(String::as_str), Some("com.example/late"));
    assert!(rest.next_cursor.is_none());
}

#[tokio::test]
async fn filters_combine() {
    let svc = seeded().await;

    let latest = svc
        .list(&ServerFilter::new().with_latest(true), None, 0)
        .await
        .unwrap();
    assert_eq!(latest.len(), 3);

    let weather = svc
        .list(&ServerFilter::new().with_name_contains("WEATHER"), None, 0)
        .await
        .unwrap();
    assert_eq!(weather.len(), 3);

    let exact = svc
        .list(
            &ServerFilter::by_name("com.example/maps").with_version("1.0.0"),
            None,
            0,
        )
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert!(!exact.items[0].is_latest());
}

#[tokio::test]
async fn updated_since_sees_demotions() {
    let svc = seeded().await;
    let checkpoint = svc
        .list(&ServerFilter::by_name("com.example/maps"), None, 0)
        .await
        .unwrap()
        .items
        .iter()
        .map(|r| r.registry.updated_at)
        .max()
        .unwrap();

    svc.publish(server("com.example/maps", "3.0.0"), &alice())
        .await
        .unwrap();

    let changed: Vec<String> = svc
        .list(&ServerFilter::new().with_updated_since(checkpoint), None, 0)
        .await
        .unwrap()
        .items
        .iter()
        .map(|r| r.version().to_string())
        .collect();
    // The demoted 2.0.0 and the new 3.0.0
    assert_eq!(changed, vec!["2.0.0", "3.0.0"]);
}

#[tokio::test]
async fn garbage_cursor_is_invalid_input() {
    let svc = seeded().await;

    let err = svc
        .list(&ServerFilter::new(), Some("%%%not-a-cursor"), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidInput(_)), "{err:?}");
}

#[tokio::test]
async fn page_size_is_clamped() {
    let mut config = RegistryConfig::default().with_daily_publish_quota(-1);
    config.default_page_size = 2;
    config.max_page_size = 3;
    let svc = service(Arc::new(InMemoryServerRepository::new()), config);
    for patch in 0..5 {
        svc.publish(server("com.example/a", &format!("1.0.{}", patch)), &alice())
            .await
            .unwrap();
    }

    assert_eq!(svc.list(&ServerFilter::new(), None, 0).await.unwrap().len(), 2);
    assert_eq!(svc.list(&ServerFilter::new(), None, 50).await.unwrap().len(), 3);
}
