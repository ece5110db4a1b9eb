//! Duplicate resolution against existing tracker listings
//!
//! An upload here is always the unpacked form of a release. An existing
//! listing with the same exact name therefore means one of two things: the
//! unpacked variant is already up (hard duplicate, abort), or only the
//! packed archive form is up (coexist, tag our filename apart).

use super::{ExistingListing, UploadError};
use crate::release::ReleaseContext;

/// Marker carried by listings of the fully unpacked variant, and appended to
/// our filename when coexisting with a packed listing of the same name.
pub const UNRARRED_TAG: &str = "[Unrarred]";

impl ExistingListing {
    /// Builds a listing from a raw search-result title, splitting off the
    /// variant marker when present.
    pub fn from_title(raw_title: &str, torrent_id: Option<u64>) -> Self {
        let trimmed = raw_title.trim();
        match trimmed.strip_suffix(UNRARRED_TAG) {
            Some(base) => Self {
                title: base.trim_end().to_string(),
                unrarred: true,
                torrent_id,
            },
            None => Self {
                title: trimmed.to_string(),
                unrarred: false,
                torrent_id,
            },
        }
    }
}

/// Verdict of duplicate resolution when the upload may proceed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateCheck {
    /// Tag to insert into the upload filename, when coexisting with a
    /// packed-form listing of the same name
    pub filename_tag: Option<&'static str>,
}

/// Classifies search results against the release's exact candidate names.
///
/// # Errors
///
/// - `UploadError::DuplicateConfirmed` - An exact-name listing already
///   carries the unpacked variant
pub fn resolve_duplicates(
    tracker: &'static str,
    listings: &[ExistingListing],
    names: &[&str],
) -> Result<DuplicateCheck, UploadError> {
    let mut packed_collision = false;

    for listing in listings {
        if !names.contains(&listing.title.as_str()) {
            continue;
        }
        if listing.unrarred {
            return Err(UploadError::DuplicateConfirmed {
                tracker,
                title: listing.title.clone(),
            });
        }
        tracing::info!(
            title = %listing.title,
            torrent_id = ?listing.torrent_id,
            "packed-form listing with the same name exists; tagging filename"
        );
        packed_collision = true;
    }

    Ok(DuplicateCheck {
        filename_tag: packed_collision.then_some(UNRARRED_TAG),
    })
}

/// Upload filename for the release: scene name when present, otherwise the
/// generated name, with the resolver's tag inserted before the extension.
pub fn torrent_filename(context: &ReleaseContext, check: &DuplicateCheck) -> String {
    let base = context.scene_name.as_deref().unwrap_or(&context.name);
    match check.filename_tag {
        Some(tag) => format!("{base} {tag}.torrent"),
        None => format!("{base}.torrent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, id: Option<u64>) -> ExistingListing {
        ExistingListing::from_title(title, id)
    }

    #[test]
    fn test_from_title_splits_variant_marker() {
        let plain = listing("Show.S01.1080p-GRP", Some(7));
        assert_eq!(plain.title, "Show.S01.1080p-GRP");
        assert!(!plain.unrarred);

        let tagged = listing("Show.S01.1080p-GRP [Unrarred]", Some(8));
        assert_eq!(tagged.title, "Show.S01.1080p-GRP");
        assert!(tagged.unrarred);
        assert_eq!(tagged.torrent_id, Some(8));
    }

    #[test]
    fn test_unrarred_exact_match_is_hard_duplicate() {
        let listings = vec![listing("Show.S01.1080p-GRP [Unrarred]", Some(8))];
        let result = resolve_duplicates("NYAA", &listings, &["Show.S01.1080p-GRP"]);
        assert!(matches!(
            result,
            Err(UploadError::DuplicateConfirmed { title, .. }) if title == "Show.S01.1080p-GRP"
        ));
    }

    #[test]
    fn test_packed_only_match_yields_filename_tag() {
        let listings = vec![listing("Show.S01.1080p-GRP", Some(7))];
        let check = resolve_duplicates("NYAA", &listings, &["Show.S01.1080p-GRP"]).unwrap();
        assert_eq!(check.filename_tag, Some(UNRARRED_TAG));
    }

    #[test]
    fn test_no_match_proceeds_untagged() {
        let listings = vec![listing("Unrelated Release", Some(3))];
        let check = resolve_duplicates("NYAA", &listings, &["Show.S01.1080p-GRP"]).unwrap();
        assert_eq!(check, DuplicateCheck::default());
    }

    #[test]
    fn test_similar_but_inexact_names_do_not_match() {
        let listings = vec![listing("Show.S01.1080p-GRP v2 [Unrarred]", Some(9))];
        let check = resolve_duplicates("NYAA", &listings, &["Show.S01.1080p-GRP"]).unwrap();
        assert_eq!(check, DuplicateCheck::default());
    }

    #[test]
    fn test_scene_name_matches_too() {
        let listings = vec![listing("Show.S01.1080p-GRP [Unrarred]", None)];
        let names = ["Show S01 1080p", "Show.S01.1080p-GRP"];
        let result = resolve_duplicates("NYAA", &listings, &names);
        assert!(matches!(result, Err(UploadError::DuplicateConfirmed { .. })));
    }

    #[test]
    fn test_filename_selection() {
        let mut context = ReleaseContext::new("u1", "Show S01 1080p", "/work");

        let untagged = torrent_filename(&context, &DuplicateCheck::default());
        assert_eq!(untagged, "Show S01 1080p.torrent");

        context.scene_name = Some("Show.S01.1080p-GRP".to_string());
        let scene = torrent_filename(&context, &DuplicateCheck::default());
        assert_eq!(scene, "Show.S01.1080p-GRP.torrent");

        let tagged = torrent_filename(
            &context,
            &DuplicateCheck {
                filename_tag: Some(UNRARRED_TAG),
            },
        );
        assert_eq!(tagged, "Show.S01.1080p-GRP [Unrarred].torrent");
    }
}
