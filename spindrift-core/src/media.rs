//! Structured media-track metadata
//!
//! Mirrors the JSON shape emitted by the upstream media inspection stage
//! (`{"media": {"track": [{"@type": "Video", ...}]}}`). The track list runs
//! parallel to the blank-line-separated blocks of the textual dump, zipped by
//! position when the description is composed.

use serde::{Deserialize, Serialize};

/// Track classification as reported by the media inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackType {
    General,
    Video,
    Audio,
    Text,
    Menu,
    #[serde(other)]
    Other,
}

impl TrackType {
    /// Whether blocks of this track type are kept in composed descriptions.
    pub fn is_presentable(self) -> bool {
        matches!(self, TrackType::General | TrackType::Video | TrackType::Audio)
    }
}

/// One track of structured media metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    #[serde(rename = "@type")]
    pub kind: TrackType,
    /// ISO language code or label, when the track declares one
    #[serde(rename = "Language", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoRoot {
    media: MediaSection,
}

#[derive(Debug, Deserialize)]
struct MediaSection {
    #[serde(default)]
    track: Vec<MediaTrack>,
}

/// Parses the media inspector's JSON output into the track list.
///
/// # Errors
///
/// - `serde_json::Error` - If the document does not carry the expected
///   `media.track` structure
pub fn parse_media_tracks(json: &str) -> Result<Vec<MediaTrack>, serde_json::Error> {
    serde_json::from_str::<MediaInfoRoot>(json).map(|root| root.media.track)
}
