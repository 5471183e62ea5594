use reqwest::StatusCode;

/// Failures surfaced to callers of [`crate::RequestCoordinator::send`].
///
/// The enum is `Clone` so a single-flight gate can broadcast one failure to
/// every joined waiter; third-party error types are flattened to message
/// strings at the boundary that produces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Config(String),
    Transport(String),
    Decode(String),
    Application { status: StatusCode, message: String },
    TerminalAuth,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::Transport(msg) => write!(f, "transport failure: {msg}"),
            Error::Decode(msg) => write!(f, "undecodable response: {msg}"),
            Error::Application { status, message } => {
                write!(f, "application failure ({status}): {message}")
            }
            Error::TerminalAuth => write!(f, "credential could not be renewed"),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Config(err.to_string())
    }
}
