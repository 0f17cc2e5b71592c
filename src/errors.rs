use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Connection, DNS or TLS level failure. Never retried by the client.
    Transport(reqwest::Error),
    /// The server answered with a document that lacks the expected fields.
    InvalidResponse(String),
    /// The request was rejected as unauthorized and refreshing the tokens did not help.
    InvalidOrExpiredToken,
    /// Structured `error` message from the server, meant for display as-is.
    ServerRejected(String),
    Config(String),
    /// A path identifier that cannot be carried in a URL, such as `..`.
    InvalidPath(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::Json(err) => write!(f, "json error: {}", err),
            Error::Transport(err) => write!(f, "transport failure: {}", err),
            Error::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
            Error::InvalidOrExpiredToken => write!(
                f,
                "the access token is invalid and the refresh operation failed"
            ),
            Error::ServerRejected(msg) => write!(f, "{}", msg),
            Error::Config(msg) => write!(f, "config error: {}", msg),
            Error::InvalidPath(segment) => write!(f, "invalid path segment '{}'", segment),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err)
    }
}
