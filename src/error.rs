use std::backtrace::Backtrace;
use std::fmt;
use thiserror::Error;

/// Which side of the exchange an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caused by the caller: bad input, 4xx-class conditions
    User,
    /// Caused by the server or infrastructure: 5xx/3xx-class conditions, malformed responses
    Server,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::User => f.write_str("user"),
            ErrorKind::Server => f.write_str("server"),
        }
    }
}

/// An error classified as either user-caused or server-caused.
///
/// Every instance is logged together with a captured backtrace at the
/// moment it is constructed. Whether the backtrace contains frames depends
/// on `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`.
pub struct GeneratedError {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    backtrace: Backtrace,
}

impl GeneratedError {
    /// Create a new error of the given kind and log it
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let backtrace = Backtrace::capture();
        tracing::error!(kind = %kind, backtrace = %backtrace, "{}", message);
        GeneratedError {
            kind,
            message,
            source: None,
            backtrace,
        }
    }

    /// Create a user error
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::User, message)
    }

    /// Create a server error
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    /// Attach an underlying cause
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Map an HTTP status to an error.
    ///
    /// Codes of 500 and above, and codes in `[300, 400)`, are server errors;
    /// codes in `[400, 500)` are user errors; anything below 300 yields `None`.
    pub fn from_status(code: u16, status: &str) -> Option<Self> {
        match code {
            500.. => Some(Self::server(status)),
            400..=499 => Some(Self::user(status)),
            300..=399 => Some(Self::server(status)),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Backtrace captured at construction
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn is_user(&self) -> bool {
        self.kind == ErrorKind::User
    }

    pub fn is_server(&self) -> bool {
        self.kind == ErrorKind::Server
    }
}

impl fmt::Debug for GeneratedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for GeneratedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GeneratedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// Classified user/server error
    #[error(transparent)]
    Generated(#[from] GeneratedError),

    /// Redirect chain exceeded the hop cap
    #[error("too many redirects (max {0})")]
    TooManyRedirects(usize),

    /// Redirect response without a usable Location header
    #[error("empty location on redirect (status {0})")]
    MissingLocation(u16),

    /// Request building error
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    /// A session id was given to a client constructed without an injector
    #[error("session id supplied but no session injector is configured")]
    NoSessionInjector,

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed email address
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Email message could not be assembled
    #[error("failed to build email: {0}")]
    Email(#[from] lettre::error::Error),

    /// SMTP transport error
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl Error {
    /// Classification of this error, when one applies
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Generated(e) => Some(e.kind()),
            Error::TooManyRedirects(_) | Error::MissingLocation(_) => Some(ErrorKind::Server),
            Error::RequestBuild(_)
            | Error::NoSessionInjector
            | Error::UrlParse(_)
            | Error::Address(_) => Some(ErrorKind::User),
            Error::Reqwest(e) => match e.status() {
                Some(status) if status.is_client_error() => Some(ErrorKind::User),
                _ => Some(ErrorKind::Server),
            },
            Error::Json(_) | Error::Smtp(_) => Some(ErrorKind::Server),
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    Some(ErrorKind::User)
                }
                _ => None,
            },
            Error::Email(_) => None,
        }
    }

    /// HTTP status code associated with this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::MissingLocation(status) => Some(*status),
            Error::Reqwest(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Log this error with a backtrace of the current call site and hand it back
    pub fn logged(self) -> Self {
        let backtrace = Backtrace::capture();
        tracing::error!(backtrace = %backtrace, "{}", self);
        self
    }
}

/// True if the error is classified as user-caused
pub fn is_user_error(err: &Error) -> bool {
    err.kind() == Some(ErrorKind::User)
}

/// True if the error is classified as server-caused
pub fn is_server_error(err: &Error) -> bool {
    err.kind() == Some(ErrorKind::Server)
}

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;
