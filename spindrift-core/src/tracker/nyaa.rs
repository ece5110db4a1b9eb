//! Nyaa-style tracker adapter
//!
//! Session-cookie authentication, RSS search, multipart form upload, and the
//! `/view/<id>` permalink scheme. The HTTP client never follows redirects:
//! the upload success indicator is the redirect target itself, and the
//! credential probe relies on seeing the redirect a stale session gets.

use std::path::PathBuf;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{self, HeaderMap, HeaderValue};

use super::duplicates::{resolve_duplicates, torrent_filename};
use super::{ExistingListing, TrackerAdapter, UploadError, UploadOutcome};
use crate::config::SpindriftConfig;
use crate::description::{DescriptionSources, compose};
use crate::metainfo::{Metainfo, finalize_for_tracker, prepare_for_tracker};
use crate::release::ReleaseContext;
use crate::{image_hosts, languages};

/// Tracker name qualifying status slots and working-directory files.
pub const TRACKER: &str = "NYAA";

/// Category tiers the tracker files anime releases under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NyaaCategory {
    EnglishTranslated,
    NonEnglishTranslated,
    Raw,
}

impl NyaaCategory {
    /// Form value for the category field.
    pub fn id(self) -> &'static str {
        match self {
            NyaaCategory::EnglishTranslated => "1_2",
            NyaaCategory::NonEnglishTranslated => "1_3",
            NyaaCategory::Raw => "1_4",
        }
    }
}

/// Request payload for the upload form, minus the artifact itself.
#[derive(Debug, Clone)]
pub struct NyaaPayload {
    pub display_name: String,
    pub category: NyaaCategory,
    pub information: String,
    pub description: String,
    pub anonymous: bool,
    pub complete: bool,
    pub remake: bool,
}

impl NyaaPayload {
    /// Textual form fields in submission order. Boolean flags are only
    /// present when set, with the form's literal `y` value.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("display_name", self.display_name.clone()),
            ("category", self.category.id().to_string()),
            ("information", self.information.clone()),
            ("description", self.description.clone()),
        ];
        if self.anonymous {
            fields.push(("is_anonymous", "y".to_string()));
        }
        if self.complete {
            fields.push(("is_complete", "y".to_string()));
        }
        if self.remake {
            fields.push(("is_remake", "y".to_string()));
        }
        fields
    }
}

/// Adapter for one Nyaa-style tracker site.
pub struct NyaaAdapter {
    config: SpindriftConfig,
    client: reqwest::Client,
}

impl NyaaAdapter {
    /// Creates the adapter with its own HTTP session.
    ///
    /// The session cookie, when configured, rides along as a default header;
    /// redirects are never followed (see module docs).
    pub fn new(config: SpindriftConfig) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.tracker.session_cookie {
            if let Ok(value) = HeaderValue::from_str(&format!("session={cookie}")) {
                headers.insert(header::COOKIE, value);
            }
        }

        let client = reqwest::Client::builder()
            .user_agent(config.network.user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("HTTP client creation should not fail");

        Self { config, client }
    }

    fn upload_endpoint(&self) -> String {
        format!("{}/upload", self.config.tracker.base_url)
    }

    fn details_url(&self, torrent_id: u64) -> String {
        format!("{}/view/{torrent_id}", self.config.tracker.base_url)
    }

    /// Phase 1 on disk: derives the tracker-specific artifact from the base
    /// one. Returns `None` when no base artifact exists yet; that is not an
    /// error at this layer.
    ///
    /// # Errors
    ///
    /// - `UploadError::Metainfo` - Base artifact unreadable or malformed
    pub async fn rewrite_torrent(
        &self,
        context: &ReleaseContext,
    ) -> Result<Option<PathBuf>, UploadError> {
        let workdir = context.workdir();
        let base_path = workdir.base_torrent();
        if !tokio::fs::try_exists(&base_path).await.unwrap_or(false) {
            tracing::debug!(path = %base_path.display(), "no base artifact; nothing to rewrite");
            return Ok(None);
        }

        let base = Metainfo::load(&base_path).await?;
        let prepared = prepare_for_tracker(&base, &self.config.tracker.announce_url);
        let tracker_path = workdir.tracker_torrent(TRACKER);
        prepared.persist(&tracker_path).await?;

        tracing::debug!(
            path = %tracker_path.display(),
            info_hash = %prepared.info_hash(),
            "wrote tracker-specific artifact"
        );
        Ok(Some(tracker_path))
    }

    /// Composes the description from the context and working-directory texts
    /// and persists it under the tracker-qualified name.
    ///
    /// # Errors
    ///
    /// - `UploadError::Description` - Media-info blocks and track metadata
    ///   do not line up
    /// - `UploadError::Io` - Working-directory read/write failed
    pub async fn generate_description(
        &self,
        context: &ReleaseContext,
    ) -> Result<String, UploadError> {
        let workdir = context.workdir();

        let disc_summary = if context.disc_type == Some(crate::release::DiscType::Bdmv) {
            read_optional(&workdir.disc_summary()).await?
        } else {
            None
        };
        let media_info = read_optional(&workdir.media_info_dump()).await?;

        let sources = DescriptionSources {
            disc_summary,
            media_info,
        };
        let description = compose(context, &sources, &self.config.tracker.signature)?;

        tokio::fs::write(workdir.description(TRACKER), &description).await?;
        Ok(description)
    }

    fn categorize(context: &ReleaseContext) -> NyaaCategory {
        let english = languages::has_english(&context.audio_languages)
            || languages::has_english(&context.subtitle_languages);
        if english {
            return NyaaCategory::EnglishTranslated;
        }

        let non_japanese =
            languages::has_language_other_than(&context.audio_languages, "japanese")
                || languages::has_language_other_than(&context.subtitle_languages, "japanese");
        if non_japanese {
            NyaaCategory::NonEnglishTranslated
        } else {
            NyaaCategory::Raw
        }
    }

    fn build_payload(
        &self,
        context: &ReleaseContext,
        category: NyaaCategory,
        description: String,
    ) -> NyaaPayload {
        NyaaPayload {
            display_name: context.name.clone(),
            category,
            information: context
                .mal_id
                .map(|id| format!("https://myanimelist.net/anime/{id}"))
                .unwrap_or_default(),
            description,
            anonymous: context.anonymous || self.config.tracker.anonymous,
            complete: context.tv_pack,
            remake: context.repack,
        }
    }

    fn request_error(url: &str, source: reqwest::Error) -> UploadError {
        if source.is_timeout() {
            UploadError::Timeout {
                url: url.to_string(),
            }
        } else {
            UploadError::Network {
                url: url.to_string(),
                source,
            }
        }
    }

    async fn submit(
        &self,
        context: &ReleaseContext,
        payload: &NyaaPayload,
        artifact_path: &std::path::Path,
        upload_filename: &str,
    ) -> Result<u64, UploadError> {
        let upload_url = self.upload_endpoint();
        let torrent_bytes = tokio::fs::read(artifact_path).await?;

        let mut form = reqwest::multipart::Form::new();
        for (key, value) in payload.form_fields() {
            form = form.text(key, value);
        }
        let part = reqwest::multipart::Part::bytes(torrent_bytes)
            .file_name(upload_filename.to_string())
            .mime_str("application/x-bittorrent")
            .expect("static MIME type should parse");
        form = form.part("torrent_file", part);

        let response = self
            .client
            .post(&upload_url)
            .multipart(form)
            .timeout(self.config.network.upload_timeout)
            .send()
            .await
            .map_err(|e| Self::request_error(&upload_url, e))?;

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|e| Self::request_error(&upload_url, e))?;

        let trace_path = context.workdir().response_trace(TRACKER);
        if let Err(e) = tokio::fs::write(&trace_path, &body).await {
            tracing::warn!(path = %trace_path.display(), error = %e, "failed to write response trace");
        }

        if status.is_redirection() {
            let location = location.ok_or_else(|| UploadError::MalformedResponse {
                tracker: TRACKER,
                reason: format!("redirect ({status}) without a Location target"),
            })?;
            return extract_view_id(&location).ok_or_else(|| UploadError::MalformedResponse {
                tracker: TRACKER,
                reason: format!("redirect target '{location}' carries no torrent id"),
            });
        }

        if status.is_success() {
            // The tracker answered the form back instead of redirecting to
            // the new listing: accepted status, but no identifier.
            return Err(UploadError::MalformedResponse {
                tracker: TRACKER,
                reason: format!("response ({status}) carries no torrent id"),
            });
        }

        Err(UploadError::Rejected {
            tracker: TRACKER,
            status: status.as_u16(),
            message: body,
        })
    }
}

#[async_trait]
impl TrackerAdapter for NyaaAdapter {
    fn tracker_name(&self) -> &'static str {
        TRACKER
    }

    async fn validate_credentials(&self) -> Result<bool, UploadError> {
        if self.config.tracker.session_cookie.is_none() {
            tracing::warn!(tracker = TRACKER, "no session cookie configured");
            return Ok(false);
        }

        let url = format!("{}/profile", self.config.tracker.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.config.network.request_timeout)
            .send()
            .await
            .map_err(|e| Self::request_error(&url, e))?;

        if response.status() == reqwest::StatusCode::OK {
            Ok(true)
        } else {
            // A stale session gets bounced to the homepage.
            tracing::warn!(
                tracker = TRACKER,
                status = %response.status(),
                "session cookie rejected"
            );
            Ok(false)
        }
    }

    async fn search_existing(&self, context: &ReleaseContext) -> Vec<ExistingListing> {
        if self.config.tracker.session_cookie.is_none() {
            tracing::warn!(tracker = TRACKER, "not authenticated; skipping duplicate search");
            return Vec::new();
        }

        let search_url = format!("{}/", self.config.tracker.base_url);
        let response = self
            .client
            .get(&search_url)
            .query(&[("q", context.name.as_str()), ("page", "rss")])
            .timeout(self.config.network.request_timeout)
            .send()
            .await;

        let body = match response {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(tracker = TRACKER, error = %e, "failed to read search response");
                    return Vec::new();
                }
            },
            Ok(response) => {
                tracing::warn!(
                    tracker = TRACKER,
                    status = %response.status(),
                    "search request declined"
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(tracker = TRACKER, error = %e, "search request failed");
                return Vec::new();
            }
        };

        let listings = parse_rss_listings(&body);
        tracing::debug!(
            tracker = TRACKER,
            query = %context.name,
            matches = listings.len(),
            "duplicate search finished"
        );
        listings
    }

    async fn upload(&self, context: &mut ReleaseContext) -> Result<UploadOutcome, UploadError> {
        let Some(artifact_path) = self.rewrite_torrent(context).await? else {
            let message = "no base torrent artifact; nothing to upload yet".to_string();
            tracing::warn!(tracker = TRACKER, uuid = %context.uuid, "{message}");
            context.status_mut(TRACKER).message = Some(message.clone());
            return Ok(UploadOutcome {
                torrent_id: None,
                details_url: None,
                message,
            });
        };

        languages::enrich_languages(context);
        image_hosts::check_hosts(context);
        let description = self.generate_description(context).await?;

        let listings = self.search_existing(context).await;
        let names = context.candidate_names();
        let check = resolve_duplicates(TRACKER, &listings, &names)?;

        let category = Self::categorize(context);
        let payload = self.build_payload(context, category, description);
        let upload_filename = torrent_filename(context, &check);

        if context.debug {
            let upload_url = self.upload_endpoint();
            let mut form = reqwest::multipart::Form::new();
            for (key, value) in payload.form_fields() {
                form = form.text(key, value);
            }
            let request = self
                .client
                .post(&upload_url)
                .multipart(form)
                .build()
                .map_err(|e| Self::request_error(&upload_url, e))?;

            tracing::info!(
                tracker = TRACKER,
                url = %request.url(),
                content_type = ?request.headers().get(header::CONTENT_TYPE),
                user_agent = self.config.network.user_agent,
                authenticated = self.config.tracker.session_cookie.is_some(),
                "debug mode: upload request constructed but not sent"
            );
            tracing::info!(
                tracker = TRACKER,
                payload = ?payload,
                filename = %upload_filename,
                "debug mode: upload payload"
            );

            let message = "debug mode: upload not sent".to_string();
            context.status_mut(TRACKER).message = Some(message.clone());
            return Ok(UploadOutcome {
                torrent_id: None,
                details_url: None,
                message,
            });
        }

        if self.config.tracker.session_cookie.is_none() {
            return Err(UploadError::MissingCredentials { tracker: TRACKER });
        }

        let torrent_id = self
            .submit(context, &payload, &artifact_path, &upload_filename)
            .await?;
        let details_url = self.details_url(torrent_id);

        // Phase 2: stamp the permanent announce endpoint and the permalink
        // into the artifact we just submitted.
        let artifact = Metainfo::load(&artifact_path).await?;
        let finalized = finalize_for_tracker(
            &artifact,
            self.config.tracker.permanent_announce_url(),
            &details_url,
        );
        finalized.persist(&artifact_path).await?;

        let message = format!("uploaded to {TRACKER}: {details_url}");
        tracing::info!(tracker = TRACKER, torrent_id, details_url = %details_url, "upload accepted");

        let status = context.status_mut(TRACKER);
        status.torrent_id = Some(torrent_id);
        status.message = Some(message.clone());

        Ok(UploadOutcome {
            torrent_id: Some(torrent_id),
            details_url: Some(details_url),
            message,
        })
    }
}

async fn read_optional(path: &std::path::Path) -> Result<Option<String>, std::io::Error> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Pulls the numeric listing id out of a `/view/<id>` URL or path.
fn extract_view_id(target: &str) -> Option<u64> {
    let index = target.find("/view/")?;
    let digits: String = target[index + "/view/".len()..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Extracts listings from an RSS or Atom search feed.
///
/// Anything unparsable yields an empty result rather than an error; the
/// duplicate search never blocks an upload on feed quirks.
fn parse_rss_listings(body: &str) -> Vec<ExistingListing> {
    let Ok(item_pattern) = Regex::new(r"(?s)<(?:item|entry)>(.*?)</(?:item|entry)>") else {
        return Vec::new();
    };
    let Ok(title_pattern) = Regex::new(r"(?s)<title>(.*?)</title>") else {
        return Vec::new();
    };

    let mut listings = Vec::new();
    for item in item_pattern.captures_iter(body) {
        let item_body = &item[1];
        let Some(title) = title_pattern.captures(item_body) else {
            continue;
        };
        let title = unescape_xml(title[1].trim());
        if title.is_empty() {
            continue;
        }
        listings.push(ExistingListing::from_title(
            &title,
            extract_view_id(item_body),
        ));
    }
    listings
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpindriftConfig;

    fn adapter() -> NyaaAdapter {
        NyaaAdapter::new(SpindriftConfig::for_testing())
    }

    fn context() -> ReleaseContext {
        ReleaseContext::new("u1", "Show S01 1080p", "/work")
    }

    #[test]
    fn test_categorize_tiers() {
        let mut ctx = context();
        ctx.audio_languages = vec!["Japanese".to_string()];
        ctx.subtitle_languages = vec!["English".to_string()];
        assert_eq!(NyaaAdapter::categorize(&ctx), NyaaCategory::EnglishTranslated);

        ctx.subtitle_languages = vec!["Spanish".to_string()];
        assert_eq!(
            NyaaAdapter::categorize(&ctx),
            NyaaCategory::NonEnglishTranslated
        );

        ctx.subtitle_languages.clear();
        assert_eq!(NyaaAdapter::categorize(&ctx), NyaaCategory::Raw);

        assert_eq!(NyaaCategory::EnglishTranslated.id(), "1_2");
        assert_eq!(NyaaCategory::NonEnglishTranslated.id(), "1_3");
        assert_eq!(NyaaCategory::Raw.id(), "1_4");
    }

    #[test]
    fn test_payload_flags_and_information_url() {
        let mut ctx = context();
        ctx.mal_id = Some(52991);
        ctx.tv_pack = true;
        ctx.repack = false;
        ctx.anonymous = false;

        let payload = adapter().build_payload(&ctx, NyaaCategory::Raw, "desc".to_string());
        let fields = payload.form_fields();

        assert!(fields.contains(&("display_name", "Show S01 1080p".to_string())));
        assert!(fields.contains(&("category", "1_4".to_string())));
        assert!(fields.contains(&(
            "information",
            "https://myanimelist.net/anime/52991".to_string()
        )));
        assert!(fields.contains(&("is_complete", "y".to_string())));
        assert!(!fields.iter().any(|(key, _)| *key == "is_remake"));
        assert!(!fields.iter().any(|(key, _)| *key == "is_anonymous"));
    }

    #[test]
    fn test_payload_anonymity_config_default_applies() {
        let mut config = SpindriftConfig::for_testing();
        config.tracker.anonymous = true;
        let adapter = NyaaAdapter::new(config);

        let payload = adapter.build_payload(&context(), NyaaCategory::Raw, String::new());
        assert!(payload.anonymous);
    }

    #[test]
    fn test_extract_view_id() {
        assert_eq!(extract_view_id("https://nyaa.si/view/1837654"), Some(1837654));
        assert_eq!(extract_view_id("/view/42?comments=1"), Some(42));
        assert_eq!(extract_view_id("/view/"), None);
        assert_eq!(extract_view_id("/upload"), None);
    }

    #[test]
    fn test_parse_rss_listings() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<rss><channel>
  <item>
    <title>Show.S01.1080p-GRP [Unrarred]</title>
    <guid>https://nyaa.si/view/101</guid>
  </item>
  <item>
    <title>Tom &amp; Jerry S02</title>
    <link>https://nyaa.si/view/102</link>
  </item>
  <item><description>no title here</description></item>
</channel></rss>"#;

        let listings = parse_rss_listings(body);
        assert_eq!(listings.len(), 2);

        assert_eq!(listings[0].title, "Show.S01.1080p-GRP");
        assert!(listings[0].unrarred);
        assert_eq!(listings[0].torrent_id, Some(101));

        assert_eq!(listings[1].title, "Tom & Jerry S02");
        assert!(!listings[1].unrarred);
        assert_eq!(listings[1].torrent_id, Some(102));
    }

    #[test]
    fn test_parse_rss_listings_tolerates_garbage() {
        assert!(parse_rss_listings("not xml at all").is_empty());
        assert!(parse_rss_listings("").is_empty());
    }

    #[tokio::test]
    async fn test_rewrite_torrent_absent_base_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ReleaseContext::new("u1", "Show", dir.path());

        let result = adapter().rewrite_torrent(&ctx).await.unwrap();
        assert!(result.is_none());
        assert!(!ctx.workdir().tracker_torrent(TRACKER).exists());
    }

    #[tokio::test]
    async fn test_rewrite_torrent_writes_tracker_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ReleaseContext::new("u1", "Show", dir.path());
        tokio::fs::create_dir_all(ctx.workdir().root()).await.unwrap();
        tokio::fs::write(
            ctx.workdir().base_torrent(),
            crate::metainfo::test_data::sample_torrent(),
        )
        .await
        .unwrap();

        let adapter = adapter();
        let path = adapter.rewrite_torrent(&ctx).await.unwrap().unwrap();
        assert_eq!(path, ctx.workdir().tracker_torrent(TRACKER));

        let base = Metainfo::load(&ctx.workdir().base_torrent()).await.unwrap();
        let rewritten = Metainfo::load(&path).await.unwrap();
        assert_eq!(
            rewritten.announce.as_deref(),
            Some(adapter.config.tracker.announce_url.as_str())
        );
        assert_eq!(rewritten.comment.as_deref(), Some(""));
        assert!(!rewritten.is_private());
        assert_eq!(rewritten.extra_keys().count(), 0);
        assert_eq!(rewritten.info_hash(), base.info_hash());
    }
}
