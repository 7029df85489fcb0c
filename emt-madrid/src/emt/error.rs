//! EMT client error types.

/// Errors from the EMT MobilityLabs client.
///
/// Soft conditions reported inside a successful response (disabled stop,
/// rate limit, rejected credentials) are not errors: the client logs them and
/// keeps its previous snapshot.
#[derive(Debug, thiserror::Error)]
pub enum EmtError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("error while connecting to EMT API: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-2xx status
    #[error("error while connecting to EMT API: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not valid JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// A success response lacked the fields its schema promises
    #[error("unable to read {context} from the API: {message}")]
    MalformedResponse {
        context: &'static str,
        message: String,
    },

    /// Only GET and POST are used by the API
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// An update was attempted before `authenticate`
    #[error("client has not authenticated yet")]
    NotAuthenticated,

    /// A credential or token could not be sent as a header
    #[error("value for header {0} contains invalid characters")]
    InvalidHeader(&'static str),
}

impl EmtError {
    pub(crate) fn malformed(context: &'static str, message: impl Into<String>) -> Self {
        EmtError::MalformedResponse {
            context,
            message: message.into(),
        }
    }
}
