//! Envelope encoding and the two tracker rewrite phases
//!
//! Phase 1 (`prepare_for_tracker`) produces the provisional artifact that is
//! submitted; phase 2 (`finalize_for_tracker`) stamps the permanent announce
//! endpoint and detail-page permalink once the tracker has assigned an id.
//! Both are pure and leave the info dictionary bytes untouched.

use std::collections::BTreeMap;

use super::Metainfo;

/// Creator prefix of the companion torrent-creation stage.
const COMPANION_CREATOR: &str = "torf";

/// Suffix appended to the companion creator's attribution.
const ATTRIBUTION_SUFFIX: &str = " + spindrift";

impl Metainfo {
    /// Encodes the artifact as canonical bencode.
    ///
    /// Top-level keys are emitted in byte order; the info dictionary and any
    /// retained unknown fields are spliced in verbatim. A false privacy flag
    /// encodes as an absent key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut fields: Vec<(&[u8], Vec<u8>)> = Vec::new();

        if let Some(announce) = &self.announce {
            fields.push((b"announce", encode_bytes(announce.as_bytes())));
        }
        if let Some(comment) = &self.comment {
            fields.push((b"comment", encode_bytes(comment.as_bytes())));
        }
        if let Some(created_by) = &self.created_by {
            fields.push((b"created by", encode_bytes(created_by.as_bytes())));
        }
        if let Some(creation_date) = self.creation_date {
            fields.push((b"creation date", encode_integer(creation_date)));
        }
        if let Some(encoding) = &self.encoding {
            fields.push((b"encoding", encode_bytes(encoding.as_bytes())));
        }
        fields.push((b"info", self.info.clone()));
        if self.private {
            fields.push((b"private", encode_integer(1)));
        }
        for (key, value) in &self.extra {
            fields.push((key.as_slice(), value.clone()));
        }

        fields.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = Vec::with_capacity(self.info.len() + 256);
        out.push(b'd');
        for (key, value) in fields {
            out.extend_from_slice(&encode_bytes(key));
            out.extend_from_slice(&value);
        }
        out.push(b'e');
        out
    }
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.len().to_string().into_bytes();
    out.push(b':');
    out.extend_from_slice(bytes);
    out
}

fn encode_integer(value: i64) -> Vec<u8> {
    format!("i{value}e").into_bytes()
}

/// Phase 1: derives the tracker-specific variant of a base artifact.
///
/// Retains only the envelope whitelist (announce, comment, created by,
/// creation date, encoding, info), overwrites announce with the tracker's
/// endpoint, clears the comment, and forces the privacy flag off. A
/// `created by` naming the companion creation tool gets the attribution
/// suffix appended.
///
/// The info dictionary bytes, and therefore the info hash, are carried
/// over unchanged.
pub fn prepare_for_tracker(base: &Metainfo, announce_url: &str) -> Metainfo {
    let mut created_by = base.created_by.clone();
    if let Some(creator) = &mut created_by {
        if creator.starts_with(COMPANION_CREATOR) && !creator.ends_with(ATTRIBUTION_SUFFIX) {
            creator.push_str(ATTRIBUTION_SUFFIX);
        }
    }

    Metainfo {
        announce: Some(announce_url.to_string()),
        comment: Some(String::new()),
        created_by,
        creation_date: base.creation_date,
        encoding: base.encoding.clone(),
        private: false,
        info: base.info.clone(),
        extra: BTreeMap::new(),
    }
}

/// Phase 2: stamps the permanent announce endpoint and detail-page comment
/// into an already tracker-specific artifact. Everything else is untouched.
pub fn finalize_for_tracker(artifact: &Metainfo, announce_url: &str, comment: &str) -> Metainfo {
    let mut finalized = artifact.clone();
    finalized.announce = Some(announce_url.to_string());
    finalized.comment = Some(comment.to_string());
    finalized
}

#[cfg(test)]
mod tests {
    use super::super::test_data::{sample_info, sample_torrent};
    use super::*;

    const ANNOUNCE: &str = "http://tracker.example:7777/announce";

    #[test]
    fn test_prepare_strips_non_whitelisted_fields() {
        let base = Metainfo::parse(&sample_torrent()).unwrap();
        let prepared = prepare_for_tracker(&base, ANNOUNCE);

        assert_eq!(prepared.announce.as_deref(), Some(ANNOUNCE));
        assert_eq!(prepared.comment.as_deref(), Some(""));
        assert!(!prepared.is_private());
        assert_eq!(prepared.extra_keys().count(), 0);

        // Re-parse the encoded output: the foreign field must be gone for good.
        let reparsed = Metainfo::parse(&prepared.to_bytes()).unwrap();
        assert_eq!(reparsed.extra_keys().count(), 0);
        assert!(!reparsed.is_private());
    }

    #[test]
    fn test_prepare_preserves_info_hash() {
        let base = Metainfo::parse(&sample_torrent()).unwrap();
        let prepared = prepare_for_tracker(&base, ANNOUNCE);

        assert_eq!(prepared.info_hash(), base.info_hash());
        assert_eq!(prepared.info_bytes(), sample_info().as_slice());
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let base = Metainfo::parse(&sample_torrent()).unwrap();
        let once = prepare_for_tracker(&base, ANNOUNCE);
        let twice = prepare_for_tracker(&once, ANNOUNCE);
        assert_eq!(once, twice);
        assert_eq!(once.to_bytes(), twice.to_bytes());
    }

    #[test]
    fn test_prepare_appends_companion_attribution_once() {
        let base = Metainfo::parse(&sample_torrent()).unwrap();
        let prepared = prepare_for_tracker(&base, ANNOUNCE);
        assert_eq!(prepared.created_by.as_deref(), Some("torf 4.2 + spindrift"));

        let again = prepare_for_tracker(&prepared, ANNOUNCE);
        assert_eq!(again.created_by.as_deref(), Some("torf 4.2 + spindrift"));
    }

    #[test]
    fn test_prepare_leaves_foreign_creators_alone() {
        let mut base = Metainfo::parse(&sample_torrent()).unwrap();
        base.created_by = Some("mktorrent 1.1".to_string());
        let prepared = prepare_for_tracker(&base, ANNOUNCE);
        assert_eq!(prepared.created_by.as_deref(), Some("mktorrent 1.1"));
    }

    #[test]
    fn test_finalize_sets_permalink_and_keeps_hash() {
        let base = Metainfo::parse(&sample_torrent()).unwrap();
        let prepared = prepare_for_tracker(&base, ANNOUNCE);
        let finalized = finalize_for_tracker(
            &prepared,
            "http://public.example/announce",
            "https://tracker.example/view/42",
        );

        assert_eq!(
            finalized.announce.as_deref(),
            Some("http://public.example/announce")
        );
        assert_eq!(
            finalized.comment.as_deref(),
            Some("https://tracker.example/view/42")
        );
        assert_eq!(finalized.created_by, prepared.created_by);
        assert_eq!(finalized.creation_date, prepared.creation_date);
        assert_eq!(finalized.info_hash(), base.info_hash());
    }

    #[test]
    fn test_encoded_keys_are_in_bencode_order() {
        let base = Metainfo::parse(&sample_torrent()).unwrap();
        let encoded = prepare_for_tracker(&base, ANNOUNCE).to_bytes();

        let announce_at = find(&encoded, b"8:announce").unwrap();
        let comment_at = find(&encoded, b"7:comment").unwrap();
        let created_by_at = find(&encoded, b"10:created by").unwrap();
        let creation_date_at = find(&encoded, b"13:creation date").unwrap();
        let info_at = find(&encoded, b"4:info").unwrap();

        assert!(announce_at < comment_at);
        assert!(comment_at < created_by_at);
        assert!(created_by_at < creation_date_at);
        assert!(creation_date_at < info_at);
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }
}
