//! Spindrift Core - tracker upload adapter building blocks
//!
//! This crate provides the components a multi-tracker release uploader embeds
//! for one tracker site: torrent envelope rewriting, release description
//! composition, duplicate resolution against existing listings, and the
//! upload submission flow itself.

pub mod config;
pub mod description;
pub mod image_hosts;
pub mod languages;
pub mod media;
pub mod metainfo;
pub mod release;
pub mod tracing_setup;
pub mod tracker;

// Re-export main types for convenient access
pub use config::SpindriftConfig;
pub use description::DescriptionError;
pub use metainfo::{InfoHash, Metainfo, MetainfoError};
pub use release::{ReleaseContext, Workdir};
pub use tracker::{NyaaAdapter, TrackerAdapter, UploadError, UploadOutcome};

/// Core errors that can bubble up from any Spindrift subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SpindriftError {
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Torrent artifact error: {0}")]
    Metainfo(#[from] MetainfoError),

    #[error("Description error: {0}")]
    Description(#[from] DescriptionError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpindriftError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            SpindriftError::Upload(e) => match e {
                UploadError::DuplicateConfirmed { tracker, title } => {
                    format!("{tracker} already carries '{title}'; upload skipped")
                }
                UploadError::MissingCredentials { tracker } => {
                    format!("No session credential configured for {tracker}")
                }
                UploadError::Timeout { url } => format!("Request to {url} timed out"),
                _ => "Upload error occurred".to_string(),
            },
            SpindriftError::Metainfo(_) => "Torrent artifact error occurred".to_string(),
            SpindriftError::Description(_) => "Description error occurred".to_string(),
            SpindriftError::Configuration { reason } => {
                format!("Configuration error: {reason}")
            }
            SpindriftError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error should be reported as a skip rather than a failure.
    ///
    /// A confirmed duplicate means the release already exists remotely; the
    /// orchestrator moves on instead of alarming.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            SpindriftError::Upload(UploadError::DuplicateConfirmed { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, SpindriftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_error_is_special_cased() {
        let error = SpindriftError::Upload(UploadError::DuplicateConfirmed {
            tracker: "NYAA",
            title: "Some.Release.1080p".to_string(),
        });
        assert!(error.is_duplicate());
        assert!(error.user_message().contains("Some.Release.1080p"));

        let other = SpindriftError::Configuration {
            reason: "missing base url".to_string(),
        };
        assert!(!other.is_duplicate());
    }
}
