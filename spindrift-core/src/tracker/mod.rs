//! Tracker adapters: duplicate resolution and upload submission
//!
//! One adapter instance owns one authenticated HTTP session and touches only
//! files qualified with its own tracker name, so the orchestrator can run
//! several adapters concurrently against the same release context.

pub mod duplicates;
pub mod nyaa;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::description::DescriptionError;
use crate::metainfo::MetainfoError;
use crate::release::ReleaseContext;

pub use duplicates::{DuplicateCheck, UNRARRED_TAG, resolve_duplicates, torrent_filename};
pub use nyaa::{NyaaAdapter, NyaaCategory};

/// Errors that can occur on the submission path.
///
/// Everything the upload flow can fail with funnels into this type; a
/// confirmed duplicate is distinctly worded so the orchestrator can report a
/// skip instead of a failure.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no session credential configured for {tracker}")]
    MissingCredentials { tracker: &'static str },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{tracker} already carries '{title}' as the unpacked variant; upload skipped")]
    DuplicateConfirmed { tracker: &'static str, title: String },

    #[error("{tracker} rejected the upload (HTTP {status}): {message}")]
    Rejected {
        tracker: &'static str,
        status: u16,
        message: String,
    },

    #[error("unexpected response from {tracker}: {reason}")]
    MalformedResponse {
        tracker: &'static str,
        reason: String,
    },

    #[error("torrent artifact error")]
    Metainfo(#[from] MetainfoError),

    #[error("description error")]
    Description(#[from] DescriptionError),

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Result of a submission attempt that did not fail outright.
///
/// Debug-mode runs and nothing-to-upload runs return an outcome without a
/// torrent id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub torrent_id: Option<u64>,
    pub details_url: Option<String>,
    pub message: String,
}

/// One remote search result, as far as duplicate resolution cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingListing {
    /// Listing title with the variant marker stripped
    pub title: String,
    /// Whether the listing is the fully unpacked/canonical variant
    pub unrarred: bool,
    /// Remote id, when the search result exposed one
    pub torrent_id: Option<u64>,
}

/// Interface one tracker site adapter implements.
///
/// The orchestrator drives each adapter as its own task; all methods borrow
/// the shared release context, and only `upload` writes back (into the
/// adapter's own status slot).
#[async_trait]
pub trait TrackerAdapter: Send + Sync {
    /// Tracker name used for status slots and file qualification.
    fn tracker_name(&self) -> &'static str;

    /// Probes whether the configured session credential is still valid.
    ///
    /// # Errors
    ///
    /// - `UploadError::Timeout` / `UploadError::Network` - Probe request failed
    async fn validate_credentials(&self) -> Result<bool, UploadError>;

    /// Searches the tracker for listings matching the release.
    ///
    /// Best-effort: missing credentials, network failures, and unparsable
    /// responses all log and yield an empty result.
    async fn search_existing(&self, context: &ReleaseContext) -> Vec<ExistingListing>;

    /// Runs the full submission flow for one release.
    ///
    /// # Errors
    ///
    /// - `UploadError::DuplicateConfirmed` - The release already exists remotely
    /// - `UploadError::MissingCredentials` - No session cookie in live mode
    /// - `UploadError::Rejected` / `UploadError::MalformedResponse` /
    ///   `UploadError::Timeout` / `UploadError::Network` - Submission failed
    async fn upload(&self, context: &mut ReleaseContext) -> Result<UploadOutcome, UploadError>;
}
