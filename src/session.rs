use crate::error::{Error, Result};
use reqwest::blocking::Request;
use reqwest::header::{HeaderName, HeaderValue, COOKIE};

/// Attaches a session identifier to an outgoing request.
///
/// The client never creates session tokens itself; it hands the fully built
/// request and the caller's session id to the injector right before dispatch.
/// Closures with the matching signature implement this trait.
pub trait SessionInjector: Send + Sync {
    fn apply_session(&self, request: Request, session_id: &str) -> Result<Request>;
}

impl<F> SessionInjector for F
where
    F: Fn(Request, &str) -> Result<Request> + Send + Sync,
{
    fn apply_session(&self, request: Request, session_id: &str) -> Result<Request> {
        self(request, session_id)
    }
}

/// Sends the session id as a cookie
#[derive(Debug, Clone)]
pub struct CookieSession {
    name: String,
}

impl CookieSession {
    pub fn new(name: impl Into<String>) -> Self {
        CookieSession { name: name.into() }
    }
}

impl SessionInjector for CookieSession {
    fn apply_session(&self, mut request: Request, session_id: &str) -> Result<Request> {
        let pair = format!("{}={}", self.name, session_id);
        let cookie = match request.headers().get(COOKIE).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.is_empty() => format!("{}; {}", existing, pair),
            _ => pair,
        };
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| Error::RequestBuild(format!("invalid session cookie: {}", e)))?;
        request.headers_mut().insert(COOKIE, value);
        Ok(request)
    }
}

/// Sends the session id in a dedicated header
#[derive(Debug, Clone)]
pub struct HeaderSession {
    header: HeaderName,
}

impl HeaderSession {
    pub fn new(header: &str) -> Result<Self> {
        let header = HeaderName::from_bytes(header.as_bytes())
            .map_err(|e| Error::RequestBuild(format!("invalid session header name: {}", e)))?;
        Ok(HeaderSession { header })
    }
}

impl SessionInjector for HeaderSession {
    fn apply_session(&self, mut request: Request, session_id: &str) -> Result<Request> {
        let value = HeaderValue::from_str(session_id)
            .map_err(|e| Error::RequestBuild(format!("invalid session id: {}", e)))?;
        request.headers_mut().insert(self.header.clone(), value);
        Ok(request)
    }
}
