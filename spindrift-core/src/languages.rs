//! Language label helpers
//!
//! Release contexts carry human-readable language labels ("English",
//! "Japanese") collected upstream, but older pipeline stages sometimes leave
//! the lists empty. This module answers the two classification questions the
//! category tiering needs and backfills absent lists from structured media
//! tracks.

use crate::media::TrackType;
use crate::release::ReleaseContext;

/// Lowercases a label and strips region/script qualifiers:
/// "English (US)" -> "english", "pt-BR" -> "pt".
fn normalize_label(label: &str) -> String {
    label
        .split(['(', '-'])
        .next()
        .unwrap_or(label)
        .trim()
        .to_ascii_lowercase()
}

/// Whether a label denotes the given language, accepting the common ISO
/// code spellings for the languages the tiering cares about.
fn matches_language(label: &str, language: &str) -> bool {
    let normalized = normalize_label(label);
    let target = normalize_label(language);
    if normalized == target {
        return true;
    }
    match target.as_str() {
        "english" => matches!(normalized.as_str(), "en" | "eng"),
        "japanese" => matches!(normalized.as_str(), "ja" | "jpn"),
        _ => false,
    }
}

/// Whether any label denotes English.
pub fn has_english(labels: &[String]) -> bool {
    labels.iter().any(|label| matches_language(label, "english"))
}

/// Whether any label denotes a language other than the given one.
pub fn has_language_other_than(labels: &[String], language: &str) -> bool {
    labels.iter().any(|label| {
        !normalize_label(label).is_empty() && !matches_language(label, language)
    })
}

/// Maps an ISO code to the display label used in descriptions; unknown codes
/// pass through with the first letter uppercased.
pub fn code_to_label(code: &str) -> String {
    match normalize_label(code).as_str() {
        "en" | "eng" | "english" => "English".to_string(),
        "ja" | "jpn" | "japanese" => "Japanese".to_string(),
        "zh" | "zho" | "chi" | "chinese" => "Chinese".to_string(),
        "ko" | "kor" | "korean" => "Korean".to_string(),
        "es" | "spa" | "spanish" => "Spanish".to_string(),
        "fr" | "fra" | "fre" | "french" => "French".to_string(),
        "de" | "deu" | "ger" | "german" => "German".to_string(),
        "it" | "ita" | "italian" => "Italian".to_string(),
        "pt" | "por" | "portuguese" => "Portuguese".to_string(),
        "ru" | "rus" | "russian" => "Russian".to_string(),
        "ar" | "ara" | "arabic" => "Arabic".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Backfills absent audio/subtitle language lists from structured media
/// tracks. Lists already populated upstream are left alone.
pub fn enrich_languages(context: &mut ReleaseContext) {
    if context.audio_languages.is_empty() {
        context.audio_languages = labels_for(context, TrackType::Audio);
        if !context.audio_languages.is_empty() {
            tracing::debug!(
                languages = ?context.audio_languages,
                "backfilled audio languages from media tracks"
            );
        }
    }
    if context.subtitle_languages.is_empty() {
        context.subtitle_languages = labels_for(context, TrackType::Text);
        if !context.subtitle_languages.is_empty() {
            tracing::debug!(
                languages = ?context.subtitle_languages,
                "backfilled subtitle languages from media tracks"
            );
        }
    }
}

fn labels_for(context: &ReleaseContext, kind: TrackType) -> Vec<String> {
    let mut labels = Vec::new();
    for media_track in context.media_tracks.iter().filter(|t| t.kind == kind) {
        if let Some(code) = media_track.language.as_deref() {
            let label = code_to_label(code);
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaTrack;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_has_english_accepts_codes_and_regions() {
        assert!(has_english(&labels(&["English"])));
        assert!(has_english(&labels(&["en"])));
        assert!(has_english(&labels(&["English (US)"])));
        assert!(!has_english(&labels(&["Japanese"])));
        assert!(!has_english(&[]));
    }

    #[test]
    fn test_has_language_other_than() {
        assert!(!has_language_other_than(&labels(&["Japanese", "ja"]), "japanese"));
        assert!(has_language_other_than(&labels(&["Japanese", "Korean"]), "japanese"));
        assert!(!has_language_other_than(&[], "japanese"));
    }

    #[test]
    fn test_code_to_label() {
        assert_eq!(code_to_label("ja"), "Japanese");
        assert_eq!(code_to_label("en"), "English");
        assert_eq!(code_to_label("pt-BR"), "Portuguese");
        assert_eq!(code_to_label("tl"), "Tl");
    }

    #[test]
    fn test_enrich_fills_only_absent_lists() {
        let mut context = ReleaseContext::new("u1", "Show", "/work");
        context.media_tracks = vec![
            MediaTrack {
                kind: TrackType::Audio,
                language: Some("ja".to_string()),
            },
            MediaTrack {
                kind: TrackType::Audio,
                language: Some("jpn".to_string()),
            },
            MediaTrack {
                kind: TrackType::Text,
                language: Some("en".to_string()),
            },
        ];
        context.subtitle_languages = vec!["Spanish".to_string()];

        enrich_languages(&mut context);

        assert_eq!(context.audio_languages, vec!["Japanese"]);
        // Populated upstream, must not be overwritten
        assert_eq!(context.subtitle_languages, vec!["Spanish"]);
    }
}
