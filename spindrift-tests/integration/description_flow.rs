//! Description composition against a populated working directory.

use spindrift_core::media::{MediaTrack, TrackType};
use spindrift_core::release::DiscType;
use spindrift_core::tracker::NyaaAdapter;
use spindrift_core::tracker::nyaa::TRACKER;

use crate::support::{release_with_base, test_config};

fn track(kind: TrackType) -> MediaTrack {
    MediaTrack {
        kind,
        language: None,
    }
}

#[tokio::test]
async fn menu_blocks_are_dropped_and_kept_blocks_stay_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;
    context.media_tracks = vec![
        track(TrackType::General),
        track(TrackType::Video),
        track(TrackType::Audio),
        track(TrackType::Menu),
    ];
    tokio::fs::write(
        context.workdir().media_info_dump(),
        "General\nComplete name : show.mkv\n\nVideo\nFormat : HEVC\n\nAudio\nFormat : FLAC\n\nMenu\n00:00:00.000 : Opening\n",
    )
    .await
    .unwrap();

    let adapter = NyaaAdapter::new(test_config("http://127.0.0.1:1"));
    let description = adapter.generate_description(&context).await.unwrap();

    assert_eq!(
        description,
        "## MediaInfo\n```\nGeneral\nComplete name : show.mkv\n\nVideo\nFormat : HEVC\n\nAudio\nFormat : FLAC\n```"
    );

    // Persisted copy matches what was returned.
    let persisted = tokio::fs::read_to_string(context.workdir().description(TRACKER))
        .await
        .unwrap();
    assert_eq!(persisted, description);
}

#[tokio::test]
async fn disc_summary_appears_only_for_bluray_releases() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;
    tokio::fs::write(
        context.workdir().disc_summary(),
        "DISC INFO:\nTotal Size: 40 GB\n",
    )
    .await
    .unwrap();

    let adapter = NyaaAdapter::new(test_config("http://127.0.0.1:1"));

    let without_disc = adapter.generate_description(&context).await.unwrap();
    assert!(!without_disc.contains("## BD Info"));

    context.disc_type = Some(DiscType::Bdmv);
    let with_disc = adapter.generate_description(&context).await.unwrap();
    assert!(with_disc.contains("## BD Info\n```\nDISC INFO:\nTotal Size: 40 GB\n```"));
}

#[tokio::test]
async fn composition_is_stable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = release_with_base(dir.path()).await;
    context.subtitle_languages = vec!["English".to_string(), "Spanish".to_string()];

    let adapter = NyaaAdapter::new(test_config("http://127.0.0.1:1"));
    let first = adapter.generate_description(&context).await.unwrap();
    let second = adapter.generate_description(&context).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, "## Subtitles\n- English\n- Spanish");
}
