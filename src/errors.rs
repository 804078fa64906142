//! Errors for this crate.

/// Rejected value for [crate::types::HostUrl].
#[derive(thiserror::Error, Debug)]
pub enum InvalidHostUrl {
    #[error("Given URL does not start with \"http://\" or \"https://\": {0}")]
    Protocol(String),

    #[error("Given URL must not contain a query string or fragment: {0}")]
    Suffix(String),
}

aliri_braid::from_infallible!(InvalidHostUrl);

/// Errors representing failed interactions with the OpenCGA web services.
#[derive(thiserror::Error, Debug)]
pub enum OpencgaError {
    /// Connection, timeout, or other network-level failure. Never retried.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Local file of an upload could not be opened or inspected.
    #[error("could not read \"{path}\": {source}")]
    UploadFile {
        path: String,
        source: std::io::Error,
    },

    /// Destination of a download could not be written.
    #[error("could not write \"{path}\": {source}")]
    DownloadFile {
        path: String,
        source: std::io::Error,
    },

    /// Response body does not match the expected schema.
    #[error("could not decode response: {source} (body starts with {excerpt:?})")]
    Decode {
        source: serde_json::Error,
        excerpt: String,
    },

    /// A local precondition was violated, or authentication was refused.
    #[error("{0}")]
    Client(String),

    /// The service reported an ERROR event or an unsuccessful HTTP status,
    /// and errors are configured to be raised.
    #[error("server error: {0}")]
    Server(String),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    InvalidHost(#[from] InvalidHostUrl),

    #[error(transparent)]
    Config(#[from] confy::ConfyError),
}

impl OpencgaError {
    pub(crate) fn client(msg: impl Into<String>) -> Self {
        OpencgaError::Client(msg.into())
    }
}
