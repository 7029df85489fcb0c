//! EMT MobilityLabs HTTP client.
//!
//! Provides async methods for logging in, reading a stop's lines and polling
//! arrival estimates. The client owns the [`StopSnapshot`] of the stop it was
//! created for and updates it in place.

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{LineInfo, LineRecord, StopId, StopSnapshot};

use super::convert::{
    ArrivalsOutcome, LoginOutcome, StopInfoOutcome, around_stop_outcome, arrivals_outcome,
    login_outcome, stop_detail_outcome,
};
use super::error::EmtError;
use super::types::Envelope;

/// Default base URL for the MobilityLabs OpenAPI.
const DEFAULT_BASE_URL: &str = "https://openapi.emtmadrid.es";

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ENDPOINT_LOGIN: &str = "v1/mobilitylabs/user/login/";
const ENDPOINT_STOP_INFO: &str = "v1/transport/busemtmad/stops/";
const ENDPOINT_ARRIVAL_TIME: &str = "v2/transport/busemtmad/stops/";
const ENDPOINT_STOPS_AROUND_STOP: &str = "v2/transport/busemtmad/stops/arroundstop/";

/// Configuration for the EMT client.
#[derive(Clone)]
pub struct EmtConfig {
    /// MobilityLabs account email
    pub email: String,
    /// MobilityLabs account password
    pub password: String,
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl EmtConfig {
    /// Create a new config with the given credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl fmt::Debug for EmtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmtConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Authentication state of a client.
#[derive(Clone, PartialEq, Eq)]
pub enum Session {
    /// `authenticate` has not been called yet.
    NotAuthenticated,
    /// Logged in with the given access token.
    Active(String),
    /// Login was refused. Updates are skipped until a new client is built.
    Rejected,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::NotAuthenticated => f.write_str("NotAuthenticated"),
            Session::Active(_) => f.write_str("Active(<token>)"),
            Session::Rejected => f.write_str("Rejected"),
        }
    }
}

/// EMT MobilityLabs API client for a single stop.
pub struct EmtClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
    password: String,
    session: Session,
    snapshot: StopSnapshot,
}

impl EmtClient {
    /// Create a new client for `stop_id`. No request is made until
    /// [`authenticate`](Self::authenticate) is called.
    pub fn new(config: EmtConfig, stop_id: StopId) -> Result<Self, EmtError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email,
            password: config.password,
            session: Session::NotAuthenticated,
            snapshot: StopSnapshot::new(stop_id),
        })
    }

    /// Current authentication state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Log in and store the access token.
    ///
    /// Rejected credentials are not an error: the client logs a warning and
    /// switches to [`Session::Rejected`], after which updates do nothing.
    pub async fn authenticate(&mut self) -> Result<(), EmtError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("email"),
            header_value("email", &self.email)?,
        );
        headers.insert(
            HeaderName::from_static("password"),
            header_value("password", &self.password)?,
        );

        let url = self.url(ENDPOINT_LOGIN);
        let envelope = self.request(Method::GET, &url, headers, None).await?;

        self.session = match login_outcome(envelope)? {
            LoginOutcome::Token(token) => {
                debug!("authenticated against EMT API");
                Session::Active(token)
            }
            LoginOutcome::Rejected { code } => {
                warn!(code = %code, "Invalid email or password");
                Session::Rejected
            }
        };
        Ok(())
    }

    /// Refresh the stop name, position, address and line table.
    ///
    /// Falls back to the around-stop endpoint when the detail endpoint
    /// reports degradation. Soft failures keep the previous snapshot.
    pub async fn update_stop_info(&mut self, stop_id: StopId) -> Result<(), EmtError> {
        let Some(headers) = self.token_headers()? else {
            debug!(stop = %stop_id, "skipping stop info update: login was rejected");
            return Ok(());
        };

        let url = self.url(&format!("{ENDPOINT_STOP_INFO}{stop_id}/detail/"));
        let envelope = self.request(Method::GET, &url, headers.clone(), None).await?;
        let mut outcome = stop_detail_outcome(envelope)?;

        if matches!(outcome, StopInfoOutcome::DegradedFallback) {
            debug!(stop = %stop_id, "detail endpoint degraded, using stops around stop");
            let url = self.url(&format!("{ENDPOINT_STOPS_AROUND_STOP}{stop_id}/0/"));
            let envelope = self.request(Method::GET, &url, headers, None).await?;
            outcome = around_stop_outcome(envelope)?;
        }

        match outcome {
            StopInfoOutcome::Disabled => {
                warn!(stop = %stop_id, "Bus stop disabled or does not exist")
            }
            StopInfoOutcome::TokenInvalid => warn!(stop = %stop_id, "Invalid token"),
            StopInfoOutcome::RateLimited => warn!(stop = %stop_id, "API limit reached"),
            StopInfoOutcome::DegradedFallback => {
                warn!(stop = %stop_id, "stop information unavailable")
            }
            StopInfoOutcome::FullSuccess(details) => {
                debug!(stop = %stop_id, lines = details.lines.len(), "stop information updated");
                self.snapshot.apply_details(details);
            }
        }
        Ok(())
    }

    /// Poll arrival estimates and replace them in the snapshot.
    pub async fn update_arrival_times(&mut self, stop_id: StopId) -> Result<(), EmtError> {
        let Some(headers) = self.token_headers()? else {
            debug!(stop = %stop_id, "skipping arrivals update: login was rejected");
            return Ok(());
        };

        let url = self.url(&format!("{ENDPOINT_ARRIVAL_TIME}{stop_id}/arrives/"));
        let body = json!({
            "stopId": stop_id.get(),
            "Text_EstimationsRequired_YN": "Y",
        });
        let envelope = self.request(Method::POST, &url, headers, Some(body)).await?;

        match arrivals_outcome(envelope)? {
            ArrivalsOutcome::StopDisabled => {
                warn!(stop = %stop_id, "Bus stop disabled or does not exist")
            }
            ArrivalsOutcome::Estimates(estimates) => {
                let received = estimates.len();
                let applied = self.snapshot.apply_arrivals(estimates);
                debug!(stop = %stop_id, received, applied, "arrival times updated");
            }
        }
        Ok(())
    }

    /// The whole stop snapshot.
    pub fn get_stop_info(&self) -> &StopSnapshot {
        &self.snapshot
    }

    /// Next and following arrival for `line`, in minutes.
    pub fn get_arrival_time(&self, line: &str) -> (Option<u32>, Option<u32>) {
        self.line(line)
            .map_or((None, None), LineRecord::arrival_pair)
    }

    /// The stored record for `line`, if the stop serves it.
    pub fn line(&self, line: &str) -> Option<&LineRecord> {
        self.snapshot.line(line)
    }

    /// Presentation view of `line`; an all-null placeholder when the stop
    /// does not serve it.
    pub fn get_line_info(&self, line: &str) -> LineInfo {
        match self.line(line) {
            Some(record) => LineInfo::from(record),
            None => {
                warn!(line, stop = %self.snapshot.stop_id(), "The bus line does not exist at this stop");
                LineInfo::placeholder()
            }
        }
    }

    /// Perform one request and decode the response envelope.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<serde_json::Value>,
    ) -> Result<Envelope, EmtError> {
        if method != Method::GET && method != Method::POST {
            return Err(EmtError::InvalidMethod(method.to_string()));
        }

        debug!(%method, url, "EMT request");
        let is_post = method == Method::POST;
        let mut request = self.http.request(method, url).headers(headers);
        if is_post {
            let body = body.unwrap_or(serde_json::Value::Null);
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmtError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| EmtError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Headers carrying the access token, or `None` when login was rejected.
    fn token_headers(&self) -> Result<Option<HeaderMap>, EmtError> {
        match &self.session {
            Session::NotAuthenticated => Err(EmtError::NotAuthenticated),
            Session::Rejected => Ok(None),
            Session::Active(token) => {
                let mut headers = HeaderMap::new();
                headers.insert(
                    HeaderName::from_static("accesstoken"),
                    header_value("accessToken", token)?,
                );
                Ok(Some(headers))
            }
        }
    }
}

impl fmt::Debug for EmtClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmtClient")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("session", &self.session)
            .field("stop_id", &self.snapshot.stop_id())
            .finish_non_exhaustive()
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, EmtError> {
    HeaderValue::from_str(value).map_err(|_| EmtError::InvalidHeader(name))
}
