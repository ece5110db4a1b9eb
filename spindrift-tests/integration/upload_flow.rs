//! Upload flows against the in-process mock tracker.

use spindrift_core::metainfo::Metainfo;
use spindrift_core::tracker::nyaa::TRACKER;
use spindrift_core::tracker::{NyaaAdapter, TrackerAdapter, UploadError};

use crate::support::{
    UploadMode, contains, release_with_base, sample_base_torrent, start_mock_tracker, test_config,
};

#[tokio::test]
async fn live_upload_end_to_end() {
    let tracker = start_mock_tracker().await;
    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;
    context.mal_id = Some(52991);

    let mut config = test_config(&tracker.base_url);
    config.tracker.public_announce_url = Some("http://public.test/announce".to_string());
    let adapter = NyaaAdapter::new(config);
    assert_eq!(adapter.tracker_name(), TRACKER);

    let outcome = adapter.upload(&mut context).await.unwrap();

    assert_eq!(outcome.torrent_id, Some(123456));
    assert_eq!(
        outcome.details_url.as_deref(),
        Some(format!("{}/view/123456", tracker.base_url).as_str())
    );

    // Status written back into the adapter's own slot.
    let status = &context.tracker_status[TRACKER];
    assert_eq!(status.torrent_id, Some(123456));
    assert!(status.message.as_deref().unwrap().contains("/view/123456"));

    // Phase 2 patch: permanent announce + permalink comment, hash unchanged.
    let base = Metainfo::parse(&sample_base_torrent()).unwrap();
    let finalized = Metainfo::load(&context.workdir().tracker_torrent(TRACKER))
        .await
        .unwrap();
    assert_eq!(
        finalized.announce.as_deref(),
        Some("http://public.test/announce")
    );
    assert_eq!(
        finalized.comment.as_deref(),
        Some(format!("{}/view/123456", tracker.base_url).as_str())
    );
    assert!(!finalized.is_private());
    assert_eq!(finalized.info_hash(), base.info_hash());

    // Response trace captured.
    assert!(context.workdir().response_trace(TRACKER).exists());

    // The multipart body carried the form fields and the artifact filename.
    let uploads = tracker.uploads();
    assert_eq!(uploads.len(), 1);
    assert!(contains(&uploads[0], b"name=\"display_name\""));
    assert!(contains(&uploads[0], b"Show S01 1080p"));
    assert!(contains(&uploads[0], b"https://myanimelist.net/anime/52991"));
    assert!(contains(
        &uploads[0],
        b"filename=\"Show S01 1080p.torrent\""
    ));
}

#[tokio::test]
async fn packed_collision_tags_the_upload_filename() {
    let tracker = start_mock_tracker().await;
    tracker.set_rss_items(&[("Show.S01.1080p-GRP", 77)]);

    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;
    context.scene_name = Some("Show.S01.1080p-GRP".to_string());

    let adapter = NyaaAdapter::new(test_config(&tracker.base_url));
    let outcome = adapter.upload(&mut context).await.unwrap();
    assert_eq!(outcome.torrent_id, Some(123456));

    let uploads = tracker.uploads();
    assert_eq!(uploads.len(), 1);
    assert!(contains(
        &uploads[0],
        b"filename=\"Show.S01.1080p-GRP [Unrarred].torrent\""
    ));
}

#[tokio::test]
async fn unrarred_listing_confirms_duplicate_and_aborts() {
    let tracker = start_mock_tracker().await;
    tracker.set_rss_items(&[("Show.S01.1080p-GRP [Unrarred]", 78)]);

    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;
    context.scene_name = Some("Show.S01.1080p-GRP".to_string());

    let adapter = NyaaAdapter::new(test_config(&tracker.base_url));
    let result = adapter.upload(&mut context).await;

    assert!(matches!(
        result,
        Err(UploadError::DuplicateConfirmed { title, .. }) if title == "Show.S01.1080p-GRP"
    ));
    assert!(tracker.uploads().is_empty());
}

#[tokio::test]
async fn rejection_carries_status_and_body() {
    let tracker = start_mock_tracker().await;
    tracker.set_upload_mode(UploadMode::Reject(400, "upload declined: bad category"));

    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;

    let adapter = NyaaAdapter::new(test_config(&tracker.base_url));
    let result = adapter.upload(&mut context).await;

    assert!(matches!(
        result,
        Err(UploadError::Rejected { status: 400, message, .. })
            if message.contains("upload declined: bad category")
    ));
}

#[tokio::test]
async fn accepted_response_without_identifier_is_malformed() {
    let tracker = start_mock_tracker().await;
    tracker.set_upload_mode(UploadMode::AcceptWithoutRedirect);

    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;

    let adapter = NyaaAdapter::new(test_config(&tracker.base_url));
    let result = adapter.upload(&mut context).await;

    assert!(matches!(result, Err(UploadError::MalformedResponse { .. })));
}

#[tokio::test]
async fn debug_mode_builds_payload_but_sends_nothing() {
    // Unroutable base URL: any attempted request would fail the test.
    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;
    context.debug = true;

    let adapter = NyaaAdapter::new(test_config("http://127.0.0.1:1"));
    let outcome = adapter.upload(&mut context).await.unwrap();

    assert!(outcome.torrent_id.is_none());
    assert!(outcome.details_url.is_none());
    assert!(outcome.message.contains("debug mode"));

    // The tracker artifact was still prepared for inspection.
    assert!(context.workdir().tracker_torrent(TRACKER).exists());
}

#[tokio::test]
async fn live_mode_without_credentials_fails_submission() {
    let tracker = start_mock_tracker().await;
    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;

    let mut config = test_config(&tracker.base_url);
    config.tracker.session_cookie = None;
    let adapter = NyaaAdapter::new(config);

    let result = adapter.upload(&mut context).await;
    assert!(matches!(
        result,
        Err(UploadError::MissingCredentials { tracker: "NYAA" })
    ));
    assert!(tracker.uploads().is_empty());
}

#[tokio::test]
async fn missing_base_artifact_reports_nothing_to_upload() {
    let tracker = start_mock_tracker().await;
    let dir = tempfile::tempdir().unwrap();
    let mut context =
        spindrift_core::release::ReleaseContext::new("test-uuid", "Show S01 1080p", dir.path());

    let adapter = NyaaAdapter::new(test_config(&tracker.base_url));
    let outcome = adapter.upload(&mut context).await.unwrap();

    assert!(outcome.torrent_id.is_none());
    assert!(outcome.message.contains("nothing to upload"));
    assert!(tracker.uploads().is_empty());
}

#[tokio::test]
async fn context_with_status_survives_serde_round_trip() {
    let tracker = start_mock_tracker().await;
    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;

    let adapter = NyaaAdapter::new(test_config(&tracker.base_url));
    adapter.upload(&mut context).await.unwrap();

    let json = serde_json::to_string(&context).unwrap();
    let restored: spindrift_core::release::ReleaseContext = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.tracker_status[TRACKER].torrent_id, Some(123456));
    assert_eq!(restored.name, context.name);
}

#[tokio::test]
async fn validate_credentials_distinguishes_live_and_stale_sessions() {
    let tracker = start_mock_tracker().await;

    let adapter = NyaaAdapter::new(test_config(&tracker.base_url));
    assert!(adapter.validate_credentials().await.unwrap());

    let mut stale = test_config(&tracker.base_url);
    stale.tracker.session_cookie = Some("stale".to_string());
    let adapter = NyaaAdapter::new(stale);
    assert!(!adapter.validate_credentials().await.unwrap());

    let mut missing = test_config(&tracker.base_url);
    missing.tracker.session_cookie = None;
    let adapter = NyaaAdapter::new(missing);
    assert!(!adapter.validate_credentials().await.unwrap());
}

#[tokio::test]
async fn search_existing_parses_mock_feed() {
    let tracker = start_mock_tracker().await;
    tracker.set_rss_items(&[
        ("Show.S01.1080p-GRP [Unrarred]", 101),
        ("Unrelated Release", 102),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let context = release_with_base(dir.path()).await;

    let adapter = NyaaAdapter::new(test_config(&tracker.base_url));
    let listings = adapter.search_existing(&context).await;

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].title, "Show.S01.1080p-GRP");
    assert!(listings[0].unrarred);
    assert_eq!(listings[0].torrent_id, Some(101));
    assert_eq!(listings[1].title, "Unrelated Release");
    assert!(!listings[1].unrarred);
}
