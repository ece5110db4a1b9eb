//! Torrent metainfo envelope handling
//!
//! A tracker adapter never re-hashes content: the info dictionary of an
//! artifact is carried as verbatim bencode bytes from parse to re-encode, so
//! the info hash is preserved by construction. Only envelope fields
//! (announce, comment, creation metadata, the privacy flag) are typed and
//! mutable.

pub mod envelope;
mod parser;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use sha1::{Digest, Sha1};

pub use envelope::{finalize_for_tracker, prepare_for_tracker};

/// SHA-1 hash identifying a torrent's content.
///
/// Computed over the raw bencode bytes of the info dictionary. Envelope
/// rewrites must never change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Creates InfoHash from 20-byte SHA-1 hash.
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Returns reference to underlying 20-byte hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Errors that can occur while reading or writing torrent artifacts.
#[derive(Debug, thiserror::Error)]
pub enum MetainfoError {
    #[error("Failed to parse torrent file: {reason}")]
    InvalidArtifact { reason: String },

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// A parsed torrent artifact: typed envelope plus verbatim content bytes.
///
/// Unknown top-level fields are kept as raw bencode so a plain
/// parse-and-re-encode round trip loses nothing; the tracker rewrite phases
/// in [`envelope`] are what drop them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metainfo {
    pub announce: Option<String>,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub creation_date: Option<i64>,
    pub encoding: Option<String>,
    /// Top-level privacy flag; absent encodes as false
    private: bool,
    /// Raw bencode of the info dictionary, never re-encoded
    info: Vec<u8>,
    /// Remaining top-level fields, key -> raw bencode value
    extra: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Metainfo {
    /// Content-identity hash of the info dictionary.
    pub fn info_hash(&self) -> InfoHash {
        let mut hasher = Sha1::new();
        hasher.update(&self.info);
        let digest = hasher.finalize();
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&digest);
        InfoHash::new(hash)
    }

    /// Raw bencode bytes of the info dictionary.
    pub fn info_bytes(&self) -> &[u8] {
        &self.info
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn set_private(&mut self, private: bool) {
        self.private = private;
    }

    /// Top-level keys outside the typed envelope, in bencode order.
    pub fn extra_keys(&self) -> impl Iterator<Item = &[u8]> {
        self.extra.keys().map(Vec::as_slice)
    }

    /// Reads and parses an artifact from disk.
    ///
    /// # Errors
    /// - `MetainfoError::Io` - File read error
    /// - `MetainfoError::InvalidArtifact` - Malformed bencode
    pub async fn load(path: &Path) -> Result<Self, MetainfoError> {
        let contents = tokio::fs::read(path).await?;
        Self::parse(&contents)
    }

    /// Encodes and writes the artifact, replacing any existing file.
    ///
    /// # Errors
    /// - `MetainfoError::Io` - File write error
    pub async fn persist(&self, path: &Path) -> Result<(), MetainfoError> {
        tokio::fs::write(path, self.to_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_data {
    /// Minimal single-file info dictionary with fixed piece bytes.
    pub fn sample_info() -> Vec<u8> {
        let mut info =
            b"d6:lengthi1048576e4:name9:test.file12:piece lengthi32768e6:pieces20:".to_vec();
        info.extend_from_slice(&[0x01; 20]);
        info.push(b'e');
        info
    }

    /// Artifact the way an earlier pipeline stage leaves it: stale announce,
    /// leftover comment, a foreign top-level field, and private set.
    pub fn sample_torrent() -> Vec<u8> {
        let mut data = b"d8:announce13:old://tracker".to_vec();
        data.extend_from_slice(b"7:comment8:homepage");
        data.extend_from_slice(b"10:created by8:torf 4.2");
        data.extend_from_slice(b"13:creation datei1700000000e");
        data.extend_from_slice(b"8:X-custom3:foo");
        data.extend_from_slice(b"4:info");
        data.extend_from_slice(&sample_info());
        data.extend_from_slice(b"7:privatei1e");
        data.push(b'e');
        data
    }
}
