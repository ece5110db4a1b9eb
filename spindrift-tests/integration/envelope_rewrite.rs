//! End-to-end envelope rewrite scenarios against real files.

use sha1::{Digest, Sha1};
use spindrift_core::metainfo::Metainfo;
use spindrift_core::tracker::NyaaAdapter;
use spindrift_core::tracker::nyaa::TRACKER;

use crate::support::{release_with_base, sample_base_torrent, sample_info, test_config};

#[tokio::test]
async fn rewrite_strips_foreign_fields_and_preserves_content_hash() {
    let dir = tempfile::tempdir().unwrap();
    let context = release_with_base(dir.path()).await;
    let adapter = NyaaAdapter::new(test_config("http://127.0.0.1:1"));

    let base = Metainfo::parse(&sample_base_torrent()).unwrap();
    assert!(base.is_private());
    assert_eq!(base.announce.as_deref(), Some("old://tracker"));
    assert_eq!(
        base.extra_keys().collect::<Vec<_>>(),
        vec![b"X-custom".as_slice()]
    );

    let tracker_path = adapter.rewrite_torrent(&context).await.unwrap().unwrap();
    let rewritten = Metainfo::load(&tracker_path).await.unwrap();

    assert!(!rewritten.is_private());
    assert_eq!(rewritten.extra_keys().count(), 0);
    assert_eq!(
        rewritten.announce.as_deref(),
        Some("http://tracker.test:7777/announce")
    );
    assert_eq!(rewritten.comment.as_deref(), Some(""));
    assert_eq!(rewritten.info_hash(), base.info_hash());

    // Cross-check against an independently computed digest of the raw info
    // dictionary bytes.
    let mut hasher = Sha1::new();
    hasher.update(sample_info());
    let expected = hex::encode(hasher.finalize());
    assert_eq!(rewritten.info_hash().to_string(), expected);
}

#[tokio::test]
async fn rewrite_twice_produces_identical_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let context = release_with_base(dir.path()).await;
    let adapter = NyaaAdapter::new(test_config("http://127.0.0.1:1"));

    let path = adapter.rewrite_torrent(&context).await.unwrap().unwrap();
    let first = tokio::fs::read(&path).await.unwrap();

    adapter.rewrite_torrent(&context).await.unwrap().unwrap();
    let second = tokio::fs::read(&path).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn rewrite_without_base_artifact_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let context =
        spindrift_core::release::ReleaseContext::new("test-uuid", "Show S01 1080p", dir.path());
    let adapter = NyaaAdapter::new(test_config("http://127.0.0.1:1"));

    let result = adapter.rewrite_torrent(&context).await.unwrap();
    assert!(result.is_none());
    assert!(!context.workdir().tracker_torrent(TRACKER).exists());
}
