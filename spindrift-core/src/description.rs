//! Release description composition
//!
//! Assembles the tracker-formatted description from independently optional
//! sections in a fixed order: screenshots, subtitle languages, disc summary,
//! media info, signature. Empty sections are omitted entirely and the output
//! is deterministic for identical input.

use thiserror::Error;

use crate::media::MediaTrack;
use crate::release::{DiscType, ReleaseContext};

/// Errors that can occur while composing a release description.
#[derive(Debug, Error)]
pub enum DescriptionError {
    /// The textual dump and the structured track list are zipped by position;
    /// diverging lengths would silently misattribute blocks.
    #[error("media-info dump has {blocks} blocks but track metadata lists {tracks} tracks")]
    TrackCountMismatch { blocks: usize, tracks: usize },

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Optional texts loaded from the release working directory.
#[derive(Debug, Clone, Default)]
pub struct DescriptionSources {
    /// Blu-ray disc summary produced upstream
    pub disc_summary: Option<String>,
    /// Raw media-info dump
    pub media_info: Option<String>,
}

/// Composes the release description.
///
/// Given identical context and sources the output is byte-identical; nothing
/// here consults the clock or any other ambient state.
///
/// # Errors
///
/// - `DescriptionError::TrackCountMismatch` - Structured track metadata does
///   not line up with the media-info dump blocks
pub fn compose(
    context: &ReleaseContext,
    sources: &DescriptionSources,
    signature: &str,
) -> Result<String, DescriptionError> {
    let mut sections: Vec<String> = Vec::new();

    if !context.screenshots.is_empty() {
        let links: Vec<String> = context
            .screenshots
            .iter()
            .map(|shot| format!("[![Screenshot]({})]({})", shot.image_url, shot.detail_url))
            .collect();
        sections.push(format!("## Screenshots\n\n{}", links.join(" ")));
    }

    if !context.subtitle_languages.is_empty() {
        let lines: Vec<String> = context
            .subtitle_languages
            .iter()
            .map(|language| format!("- {language}"))
            .collect();
        sections.push(format!("## Subtitles\n{}", lines.join("\n")));
    }

    if context.disc_type == Some(DiscType::Bdmv) {
        if let Some(summary) = sources.disc_summary.as_deref() {
            if !summary.trim().is_empty() {
                sections.push(format!("## BD Info\n```\n{}\n```", summary.trim_end()));
            }
        }
    }

    if let Some(dump) = sources.media_info.as_deref() {
        let body = filter_media_info(dump, &context.media_tracks)?;
        if !body.is_empty() {
            sections.push(format!("## MediaInfo\n```\n{body}\n```"));
        }
    }

    if !signature.is_empty() {
        sections.push(signature.to_string());
    }

    Ok(sections.join("\n\n"))
}

/// Keeps only the General/Video/Audio blocks of a media-info dump.
///
/// Blocks are separated by blank lines and run parallel to the structured
/// track list; kept blocks stay verbatim and in their original order. With
/// no structured tracks available the dump passes through whole.
fn filter_media_info(dump: &str, tracks: &[MediaTrack]) -> Result<String, DescriptionError> {
    let trimmed = dump.trim_end();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if tracks.is_empty() {
        return Ok(trimmed.to_string());
    }

    let blocks: Vec<&str> = trimmed.split("\n\n").collect();
    if blocks.len() != tracks.len() {
        return Err(DescriptionError::TrackCountMismatch {
            blocks: blocks.len(),
            tracks: tracks.len(),
        });
    }

    let kept: Vec<&str> = blocks
        .iter()
        .zip(tracks)
        .filter(|(_, track)| track.kind.is_presentable())
        .map(|(block, _)| *block)
        .collect();

    Ok(kept.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TrackType;
    use crate::release::Screenshot;

    fn context() -> ReleaseContext {
        ReleaseContext::new("u1", "Show S01 1080p", "/work")
    }

    fn track(kind: TrackType) -> MediaTrack {
        MediaTrack {
            kind,
            language: None,
        }
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let output = compose(&context(), &DescriptionSources::default(), "").unwrap();
        assert!(output.is_empty());
        assert!(!output.contains("## Screenshots"));
        assert!(!output.contains("## Subtitles"));
    }

    #[test]
    fn test_screenshot_section_links_thumbnails() {
        let mut ctx = context();
        ctx.screenshots = vec![
            Screenshot {
                image_url: "https://img.example/a.png".to_string(),
                detail_url: "https://img.example/view/a".to_string(),
            },
            Screenshot {
                image_url: "https://img.example/b.png".to_string(),
                detail_url: "https://img.example/view/b".to_string(),
            },
        ];

        let output = compose(&ctx, &DescriptionSources::default(), "").unwrap();
        assert!(output.starts_with("## Screenshots\n\n"));
        assert!(output.contains(
            "[![Screenshot](https://img.example/a.png)](https://img.example/view/a)"
        ));
        assert!(output.contains(
            "[![Screenshot](https://img.example/b.png)](https://img.example/view/b)"
        ));
    }

    #[test]
    fn test_subtitles_keep_supplied_order() {
        let mut ctx = context();
        ctx.subtitle_languages = vec!["English".to_string(), "Spanish".to_string()];

        let output = compose(&ctx, &DescriptionSources::default(), "").unwrap();
        assert_eq!(output, "## Subtitles\n- English\n- Spanish");
    }

    #[test]
    fn test_disc_summary_requires_bluray_disc_type() {
        let sources = DescriptionSources {
            disc_summary: Some("DISC INFO:\nTotal 40 GB".to_string()),
            media_info: None,
        };

        let without_disc = compose(&context(), &sources, "").unwrap();
        assert!(!without_disc.contains("## BD Info"));

        let mut ctx = context();
        ctx.disc_type = Some(DiscType::Bdmv);
        let with_disc = compose(&ctx, &sources, "").unwrap();
        assert_eq!(with_disc, "## BD Info\n```\nDISC INFO:\nTotal 40 GB\n```");
    }

    #[test]
    fn test_media_info_drops_menu_blocks_verbatim_in_order() {
        let mut ctx = context();
        ctx.media_tracks = vec![
            track(TrackType::General),
            track(TrackType::Video),
            track(TrackType::Audio),
            track(TrackType::Menu),
        ];
        let sources = DescriptionSources {
            disc_summary: None,
            media_info: Some(
                "General\nFormat : Matroska\n\nVideo\nFormat : HEVC\n\nAudio\nFormat : FLAC\n\nMenu\n00:00:00.000 : Opening\n".to_string(),
            ),
        };

        let output = compose(&ctx, &sources, "").unwrap();
        assert_eq!(
            output,
            "## MediaInfo\n```\nGeneral\nFormat : Matroska\n\nVideo\nFormat : HEVC\n\nAudio\nFormat : FLAC\n```"
        );
    }

    #[test]
    fn test_media_info_count_mismatch_fails_fast() {
        let mut ctx = context();
        ctx.media_tracks = vec![track(TrackType::General), track(TrackType::Video)];
        let sources = DescriptionSources {
            disc_summary: None,
            media_info: Some("General\n\nVideo\n\nAudio".to_string()),
        };

        let result = compose(&ctx, &sources, "");
        assert!(matches!(
            result,
            Err(DescriptionError::TrackCountMismatch { blocks: 3, tracks: 2 })
        ));
    }

    #[test]
    fn test_media_info_passes_through_without_track_metadata() {
        let sources = DescriptionSources {
            disc_summary: None,
            media_info: Some("General\n\nVideo\n\nMenu".to_string()),
        };
        let output = compose(&context(), &sources, "").unwrap();
        assert_eq!(output, "## MediaInfo\n```\nGeneral\n\nVideo\n\nMenu\n```");
    }

    #[test]
    fn test_signature_comes_last() {
        let mut ctx = context();
        ctx.subtitle_languages = vec!["English".to_string()];
        let output =
            compose(&ctx, &DescriptionSources::default(), "shared via spindrift").unwrap();
        assert!(output.ends_with("\n\nshared via spindrift"));
    }

    #[test]
    fn test_composition_is_deterministic() {
        let mut ctx = context();
        ctx.screenshots = vec![Screenshot {
            image_url: "https://img.example/a.png".to_string(),
            detail_url: "https://img.example/view/a".to_string(),
        }];
        ctx.subtitle_languages = vec!["English".to_string()];
        let sources = DescriptionSources {
            disc_summary: None,
            media_info: Some("General\nFormat : Matroska".to_string()),
        };

        let first = compose(&ctx, &sources, "sig").unwrap();
        let second = compose(&ctx, &sources, "sig").unwrap();
        assert_eq!(first, second);
    }
}
