//! # End-to-end publish flows against the in-memory store
//!
//! Each test drives the full four-stage pipeline through a
//! [`MemoryStore`], which implements compare-and-swap on per-path tokens
//! the same way the hosted store does.

use std::sync::Arc;

use vitrine_core::{manifest, ArtifactMetadata, ArtifactRecord, CatalogLayout, NewArtifact};
use vitrine_store::{MemoryStore, RemoteStore, StoreError, StoreOp};
use vitrine_sync::{
    merge, CatalogCache, ManifestRecovery, PublishError, PublishStage, Publisher,
};

const MANIFEST: &str = "gallery.json";

fn publisher(store: &MemoryStore) -> Publisher<MemoryStore> {
    Publisher::new(Arc::new(store.clone()), CatalogLayout::default())
}

fn artifact(name: &str, title: &str) -> NewArtifact {
    NewArtifact::new(
        name,
        format!("bytes of {name}").into_bytes(),
        ArtifactMetadata {
            title: title.to_string(),
            ..Default::default()
        },
    )
}

fn stored_manifest(store: &MemoryStore) -> Vec<ArtifactRecord> {
    manifest::decode_json(&store.raw(MANIFEST).expect("manifest exists")).expect("manifest decodes")
}

fn seed_manifest(store: &MemoryStore, json: &str) {
    store.put_raw(MANIFEST, json);
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn scenario_a_first_publish_creates_manifest() {
    let store = MemoryStore::new();
    let receipt = publisher(&store)
        .publish(artifact("x.png", "X"))
        .await
        .expect("publish succeeds");

    let records = stored_manifest(&store);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "X");
    assert_eq!(records[0], receipt.record);
    assert_eq!(receipt.manifest_len, 1);
    assert_eq!(store.token(MANIFEST), Some(receipt.manifest_token));
}

#[tokio::test]
async fn scenario_b_new_record_is_prepended() {
    let store = MemoryStore::new();
    seed_manifest(
        &store,
        r#"[{"id":"a","locator":"memory:///images/a.png","title":"A"}]"#,
    );

    let receipt = publisher(&store)
        .publish(artifact("b.png", "B"))
        .await
        .unwrap();

    let records = stored_manifest(&store);
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![receipt.record.id.as_str(), "a"]);
    assert_eq!(records[1].title, "A");
}

#[tokio::test]
async fn scenario_c_stale_token_is_a_conflict() {
    let store = MemoryStore::new();
    seed_manifest(&store, "[]");
    let publisher = publisher(&store);

    let fetched = publisher.fetch_manifest().await.unwrap();
    // Another writer commits after our fetch.
    seed_manifest(
        &store,
        r#"[{"id":"other","locator":"memory:///images/o.png"}]"#,
    );

    let record = ArtifactRecord::new(
        vitrine_core::ArtifactId::generate(),
        "memory:///images/mine.png",
        ArtifactMetadata::default(),
        vitrine_core::Timestamp::now(),
    );
    let merged = merge(&fetched, record);
    let err = publisher
        .commit_manifest(&merged, fetched.token.clone(), "add mine".into())
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(err.stage(), Some(PublishStage::CommitManifest));
    let records = stored_manifest(&store);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id.as_str(), "other");
}

#[tokio::test]
async fn scenario_d_corrupt_manifest_is_treated_as_empty() {
    let store = MemoryStore::new();
    seed_manifest(&store, "{ this is not json");
    let publisher = publisher(&store);

    let fetched = publisher.fetch_manifest().await.unwrap();
    assert!(fetched.records.is_empty());
    assert!(fetched.recovered_from_corruption);
    assert!(fetched.token.is_some());

    let receipt = publisher.publish(artifact("d.png", "D")).await.unwrap();
    assert!(receipt.recovered_from_corruption);
    assert_eq!(stored_manifest(&store), vec![receipt.record]);
}

#[tokio::test]
async fn corrupt_manifest_can_be_protected() {
    let store = MemoryStore::new();
    seed_manifest(&store, "{ this is not json");
    let err = publisher(&store)
        .with_recovery(ManifestRecovery::Abort)
        .publish(artifact("d.png", "D"))
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::CorruptManifest { .. }));
    assert_eq!(store.raw(MANIFEST).unwrap(), b"{ this is not json");
}

#[tokio::test]
async fn five_digit_year_is_refused_not_recommitted() {
    let store = MemoryStore::new();
    let seeded = r#"[{"id":"far","locator":"memory:///images/f.png","createdAt":300000000000000}]"#;
    seed_manifest(&store, seeded);

    let fetched = publisher(&store).fetch_manifest().await.unwrap();
    assert!(fetched.recovered_from_corruption);
    assert!(fetched.records.is_empty());

    let err = publisher(&store)
        .with_recovery(ManifestRecovery::Abort)
        .publish(artifact("n.png", "N"))
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::CorruptManifest { .. }));
    assert_eq!(store.raw(MANIFEST).unwrap(), seeded.as_bytes());
}

#[tokio::test]
async fn year_9999_survives_a_recommit() {
    let store = MemoryStore::new();
    seed_manifest(
        &store,
        r#"[{"id":"late","locator":"memory:///images/l.png","createdAt":"9999-12-31T23:59:59.999Z"}]"#,
    );

    let receipt = publisher(&store).publish(artifact("n.png", "N")).await.unwrap();
    assert!(!receipt.recovered_from_corruption);

    let records = stored_manifest(&store);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].created_at.to_rfc3339(), "9999-12-31T23:59:59.999Z");
}

// =========================================================================
// Properties
// =========================================================================

#[tokio::test]
async fn racing_writer_is_never_overwritten() {
    let store = MemoryStore::new();
    seed_manifest(&store, "[]");
    store.after_next_versioned_read(|s| {
        s.put_raw(
            MANIFEST,
            r#"[{"id":"first","locator":"memory:///images/first.png"}]"#,
        );
    });

    let err = publisher(&store)
        .publish(artifact("second.png", "Second"))
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(err.status().contains("changed since it was read"));
    let records = stored_manifest(&store);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id.as_str(), "first");
}

#[tokio::test]
async fn sequential_publishes_are_newest_first() {
    let store = MemoryStore::new();
    let publisher = publisher(&store);

    let mut published = Vec::new();
    for i in 0..5 {
        let receipt = publisher
            .publish(artifact(&format!("r{i}.png"), &format!("r{i}")))
            .await
            .unwrap();
        published.push(receipt.record);
    }

    published.reverse();
    assert_eq!(stored_manifest(&store), published);
}

#[tokio::test]
async fn locator_is_readable_when_manifest_commits() {
    let store = MemoryStore::new();
    // Runs between fetch and commit, after the upload stage.
    store.after_next_versioned_read(|s| {
        assert!(s.paths().iter().any(|p| p.starts_with("images/")));
    });

    let receipt = publisher(&store)
        .publish(artifact("sunset.png", "Sunset"))
        .await
        .unwrap();

    assert_eq!(
        receipt.record.locator,
        store.public_url(&receipt.binary_path)
    );
    assert_eq!(
        store.raw(&receipt.binary_path).unwrap(),
        b"bytes of sunset.png"
    );
}

#[tokio::test]
async fn upload_failure_stops_before_manifest() {
    let store = MemoryStore::new();
    store.fail_next(
        StoreOp::Write,
        StoreError::Timeout {
            endpoint: "memory".into(),
        },
    );

    let err = publisher(&store)
        .publish(artifact("x.png", "X"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(PublishStage::UploadBinary));
    assert!(!store.contains(MANIFEST));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn commit_failure_leaves_binary_unreferenced() {
    let store = MemoryStore::new();
    store.fail_next_at(
        StoreOp::Write,
        MANIFEST,
        StoreError::Network {
            endpoint: "memory".into(),
            message: "connection reset".into(),
        },
    );

    let err = publisher(&store)
        .publish(artifact("x.png", "X"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(PublishStage::CommitManifest));
    assert!(err.status().contains("not listed"));
    assert!(!store.contains(MANIFEST));
    assert_eq!(store.paths().len(), 1);
}

#[tokio::test]
async fn invalid_artifact_touches_nothing() {
    let store = MemoryStore::new();
    let err = publisher(&store)
        .publish(NewArtifact::new("x.png", Vec::new(), ArtifactMetadata::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::InvalidArtifact(_)));
    assert_eq!(err.stage(), None);
    assert!(store.paths().is_empty());
}

#[tokio::test]
async fn concurrent_local_attempts_are_serialized() {
    let store = MemoryStore::new();
    let publisher = publisher(&store);

    let (a, b) = tokio::join!(
        publisher.publish(artifact("a.png", "A")),
        publisher.publish(artifact("b.png", "B")),
    );
    a.unwrap();
    b.unwrap();

    assert!(!publisher.is_publishing());
    assert_eq!(stored_manifest(&store).len(), 2);
}

#[tokio::test]
async fn custom_layout_is_honored() {
    let store = MemoryStore::new();
    let layout = CatalogLayout {
        manifest_path: "data/catalog.json".into(),
        binary_dir: "art".into(),
    };
    let receipt = Publisher::new(Arc::new(store.clone()), layout)
        .publish(artifact("Big Sur.JPG", "Coast"))
        .await
        .unwrap();

    assert!(receipt.binary_path.starts_with("art/"));
    assert!(receipt.binary_path.ends_with("-bigsur.jpg"));
    assert!(store.contains("data/catalog.json"));
}

// =========================================================================
// Catalog cache
// =========================================================================

#[tokio::test]
async fn cache_survives_refresh_failure() {
    let store = MemoryStore::new();
    seed_manifest(
        &store,
        r#"[{"id":"a","locator":"memory:///images/a.png","title":"A"}]"#,
    );
    let cache = CatalogCache::new(MANIFEST);
    assert_eq!(cache.refresh(&store).await.len(), 1);

    store.fail_next(
        StoreOp::ReadPublic,
        StoreError::Network {
            endpoint: "memory".into(),
            message: "offline".into(),
        },
    );
    let after = cache.refresh(&store).await;

    assert_eq!(after.len(), 1);
    assert_eq!(cache.snapshot()[0].title, "A");
}

#[tokio::test]
async fn successful_publish_updates_attached_cache() {
    let store = MemoryStore::new();
    let cache = Arc::new(CatalogCache::new(MANIFEST));
    let publisher = publisher(&store).with_cache(Arc::clone(&cache));

    publisher.publish(artifact("a.png", "A")).await.unwrap();
    publisher.publish(artifact("b.png", "B")).await.unwrap();

    let titles: Vec<String> = cache.snapshot().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["B".to_string(), "A".to_string()]);
}

#[tokio::test]
async fn failed_publish_leaves_cache_alone() {
    let store = MemoryStore::new();
    let cache = Arc::new(CatalogCache::new(MANIFEST));
    let publisher = publisher(&store).with_cache(Arc::clone(&cache));
    publisher.publish(artifact("a.png", "A")).await.unwrap();

    store.fail_next_at(
        StoreOp::Write,
        MANIFEST,
        StoreError::Conflict {
            path: MANIFEST.into(),
        },
    );
    publisher.publish(artifact("b.png", "B")).await.unwrap_err();

    assert_eq!(cache.len(), 1);
}
