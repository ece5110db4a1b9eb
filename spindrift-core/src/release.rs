//! Release context and working-directory conventions
//!
//! The release context is the unit of work handed over by the orchestrator:
//! one prepared release plus the metadata collected for it earlier in the
//! pipeline. An adapter only reads it, except for the per-tracker status
//! slot it writes back after a submission attempt.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::media::MediaTrack;

/// One screenshot: the hosted image plus the host's detail page for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    pub image_url: String,
    pub detail_url: String,
}

/// Disc structure of a release, when it is a disc at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscType {
    #[serde(rename = "BDMV")]
    Bdmv,
    #[serde(rename = "DVD")]
    Dvd,
}

/// Per-tracker result slot written back after a submission attempt.
///
/// Each tracker writes a disjoint key of the context's status map, so
/// concurrently running adapters never contend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerStatus {
    pub torrent_id: Option<u64>,
    pub message: Option<String>,
}

/// A prepared release and everything collected about it upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseContext {
    /// Unique identifier; also names the working directory
    pub uuid: String,
    /// Generated release name
    pub name: String,
    /// Scene-style release name, when the release came from a scene source
    #[serde(default)]
    pub scene_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub disc_type: Option<DiscType>,
    /// Multiple episodes/items bundled as one submission
    #[serde(default)]
    pub tv_pack: bool,
    #[serde(default)]
    pub repack: bool,
    /// Release-level anonymity override; the tracker config default applies
    /// when this is false
    #[serde(default)]
    pub anonymous: bool,
    /// When set, adapters trace requests instead of sending them
    #[serde(default)]
    pub debug: bool,
    /// Root under which `tmp/<uuid>/` working directories live
    pub base_dir: PathBuf,
    /// External catalog id (MyAnimeList), when known
    #[serde(default)]
    pub mal_id: Option<u64>,
    #[serde(default)]
    pub screenshots: Vec<Screenshot>,
    #[serde(default)]
    pub audio_languages: Vec<String>,
    #[serde(default)]
    pub subtitle_languages: Vec<String>,
    /// Structured track metadata parallel to the media-info dump
    #[serde(default)]
    pub media_tracks: Vec<MediaTrack>,
    #[serde(default)]
    pub tracker_status: HashMap<String, TrackerStatus>,
}

impl ReleaseContext {
    /// Creates a context with the required identity fields; everything else
    /// starts empty and is filled in by upstream pipeline stages.
    pub fn new(
        uuid: impl Into<String>,
        name: impl Into<String>,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            scene_name: None,
            category: None,
            resolution: None,
            disc_type: None,
            tv_pack: false,
            repack: false,
            anonymous: false,
            debug: false,
            base_dir: base_dir.into(),
            mal_id: None,
            screenshots: Vec::new(),
            audio_languages: Vec::new(),
            subtitle_languages: Vec::new(),
            media_tracks: Vec::new(),
            tracker_status: HashMap::new(),
        }
    }

    /// Working directory for this release.
    pub fn workdir(&self) -> Workdir {
        Workdir::new(&self.base_dir, &self.uuid)
    }

    /// The exact set of names an existing remote listing may carry for this
    /// release: the generated name and, when present, the scene name.
    pub fn candidate_names(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        if let Some(scene_name) = self.scene_name.as_deref() {
            names.push(scene_name);
        }
        names
    }

    /// Mutable status slot for one tracker, created on first access.
    pub fn status_mut(&mut self, tracker: &str) -> &mut TrackerStatus {
        self.tracker_status.entry(tracker.to_string()).or_default()
    }
}

/// Fixed file-naming conventions inside a release working directory.
///
/// All adapter reads and writes go through these paths; tracker-specific
/// outputs are qualified with the tracker name so concurrent adapters never
/// touch each other's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workdir {
    root: PathBuf,
}

impl Workdir {
    pub fn new(base_dir: &Path, uuid: &str) -> Self {
        Self {
            root: base_dir.join("tmp").join(uuid),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Base torrent artifact produced by the creation stage.
    pub fn base_torrent(&self) -> PathBuf {
        self.root.join("BASE.torrent")
    }

    /// Tracker-specific torrent artifact.
    pub fn tracker_torrent(&self, tracker: &str) -> PathBuf {
        self.root.join(format!("[{tracker}].torrent"))
    }

    /// Composed release description for one tracker.
    pub fn description(&self, tracker: &str) -> PathBuf {
        self.root.join(format!("[{tracker}]DESCRIPTION.txt"))
    }

    /// Media-info dump produced upstream, when any.
    pub fn media_info_dump(&self) -> PathBuf {
        self.root.join("MEDIAINFO.txt")
    }

    /// Blu-ray disc summary produced upstream, when any.
    pub fn disc_summary(&self) -> PathBuf {
        self.root.join("BD_SUMMARY_00.txt")
    }

    /// Raw upload response captured for one tracker in live mode.
    pub fn response_trace(&self, tracker: &str) -> PathBuf {
        self.root.join(format!("[{tracker}]upload_response.html"))
    }
}
