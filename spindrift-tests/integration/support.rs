//! Shared fixtures and the in-process mock tracker.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use spindrift_core::config::SpindriftConfig;
use spindrift_core::release::ReleaseContext;

/// Minimal single-file info dictionary with fixed piece bytes.
pub fn sample_info() -> Vec<u8> {
    let mut info =
        b"d6:lengthi1048576e4:name9:test.file12:piece lengthi32768e6:pieces20:".to_vec();
    info.extend_from_slice(&[0x01; 20]);
    info.push(b'e');
    info
}

/// Base artifact the way an earlier pipeline stage leaves it: stale
/// announce, leftover comment, a foreign top-level field, and private set.
pub fn sample_base_torrent() -> Vec<u8> {
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

/// Creates a release context with a populated working directory containing
/// the base artifact.
pub async fn release_with_base(base_dir: &std::path::Path) -> ReleaseContext {
    let context = ReleaseContext::new("test-uuid", "Show S01 1080p", base_dir);
    tokio::fs::create_dir_all(context.workdir().root())
        .await
        .unwrap();
    tokio::fs::write(context.workdir().base_torrent(), sample_base_torrent())
        .await
        .unwrap();
    context
}

/// Adapter configuration pointed at the mock tracker.
pub fn test_config(base_url: &str) -> SpindriftConfig {
    let mut config = SpindriftConfig::for_testing();
    config.tracker.base_url = base_url.to_string();
    config.tracker.session_cookie = Some("valid".to_string());
    config.tracker.announce_url = "http://tracker.test:7777/announce".to_string();
    config
}

/// Naive subsequence search for asserting on raw multipart bodies.
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

/// How the mock tracker answers upload requests.
#[derive(Debug, Clone, Copy)]
pub enum UploadMode {
    /// Redirect to `/view/<id>` like a successful form submission
    Accept(u64),
    /// Decline with a status and body
    Reject(u16, &'static str),
    /// Answer 200 with the form page again (no identifier anywhere)
    AcceptWithoutRedirect,
}

#[derive(Debug)]
pub struct MockState {
    pub rss_body: Mutex<String>,
    pub uploads: Mutex<Vec<Vec<u8>>>,
    pub upload_mode: Mutex<UploadMode>,
}

pub struct MockTracker {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockTracker {
    pub fn set_rss_items(&self, titles_and_ids: &[(&str, u64)]) {
        let items: String = titles_and_ids
            .iter()
            .map(|(title, id)| {
                format!(
                    "<item><title>{title}</title><guid>https://nyaa.test/view/{id}</guid></item>"
                )
            })
            .collect();
        *self.state.rss_body.lock().unwrap() =
            format!("<?xml version=\"1.0\"?><rss><channel>{items}</channel></rss>");
    }

    pub fn set_upload_mode(&self, mode: UploadMode) {
        *self.state.upload_mode.lock().unwrap() = mode;
    }

    pub fn uploads(&self) -> Vec<Vec<u8>> {
        self.state.uploads.lock().unwrap().clone()
    }
}

/// Starts the mock tracker on an ephemeral port.
pub async fn start_mock_tracker() -> MockTracker {
    let state = Arc::new(MockState {
        rss_body: Mutex::new(
            "<?xml version=\"1.0\"?><rss><channel></channel></rss>".to_string(),
        ),
        uploads: Mutex::new(Vec::new()),
        upload_mode: Mutex::new(UploadMode::Accept(123456)),
    });

    let app = Router::new()
        .route("/profile", get(profile))
        .route("/", get(search))
        .route("/upload", post(upload))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockTracker {
        base_url: format!("http://{addr}"),
        state,
    }
}

async fn profile(headers: HeaderMap) -> Response {
    let cookie = headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if cookie.contains("session=valid") {
        StatusCode::OK.into_response()
    } else {
        // Stale or missing sessions bounce to the homepage
        Redirect::to("/").into_response()
    }
}

async fn search(State(state): State<Arc<MockState>>) -> Response {
    let body = state.rss_body.lock().unwrap().clone();
    ([(CONTENT_TYPE, "application/xml")], body).into_response()
}

async fn upload(State(state): State<Arc<MockState>>, body: Bytes) -> Response {
    state.uploads.lock().unwrap().push(body.to_vec());
    let mode = *state.upload_mode.lock().unwrap();
    match mode {
        UploadMode::Accept(id) => Redirect::to(&format!("/view/{id}")).into_response(),
        UploadMode::Reject(status, message) => (
            StatusCode::from_u16(status).expect("test status codes are valid"),
            message,
        )
            .into_response(),
        UploadMode::AcceptWithoutRedirect => {
            (StatusCode::OK, "<html>upload form</html>").into_response()
        }
    }
}
