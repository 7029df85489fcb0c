//! Shared helpers for the wiremock-based tests.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "3bd5855a-ed3d-41d5-8b4b-182726f86031";

pub const LOGIN_PATH: &str = "/v1/mobilitylabs/user/login/";

pub fn detail_path(stop: u32) -> String {
    format!("/v1/transport/busemtmad/stops/{stop}/detail/")
}

pub fn around_stop_path(stop: u32) -> String {
    format!("/v2/transport/busemtmad/stops/arroundstop/{stop}/0/")
}

pub fn arrivals_path(stop: u32) -> String {
    format!("/v2/transport/busemtmad/stops/{stop}/arrives/")
}

/// Load a JSON fixture from `tests/fixtures`.
pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

/// A 200 response carrying the given fixture.
pub fn json_response(name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(fixture(name))
}

/// Mount `fixture` as the answer to `verb path`.
pub async fn mount(server: &MockServer, verb: &str, route: &str, name: &str) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(json_response(name))
        .mount(server)
        .await;
}

/// Mount the happy path for stop 72: login, stop detail and arrivals.
pub async fn mount_happy_path(server: &MockServer) {
    mount(server, "GET", LOGIN_PATH, "login_ok.json").await;
    mount(server, "GET", &detail_path(72), "stop_detail_ok.json").await;
    mount(server, "POST", &arrivals_path(72), "arrivals_ok.json").await;
}

/// Log lines written while a [`capture_logs`] guard is alive.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(Arc::clone(&self.0))
    }
}

/// Route this thread's tracing output into memory until the guard drops.
///
/// `#[tokio::test]` runs on a current-thread runtime, so every event of the
/// test body lands here.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
