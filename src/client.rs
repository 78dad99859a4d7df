use crate::error::{Error, Result};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Host name used in URLs when the transport connects over a local socket
pub const LOCAL_SOCKET_HOST: &str = "fakehost.fak";

/// Create the default HTTP client for REST API requests.
///
/// Redirects are never followed automatically: callers either see the 3xx
/// response or, for form posts, the client follows it explicitly.
pub fn create_rest_client() -> Result<Client> {
    let client = ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .timeout(Duration::from_secs(300)) // 5 minutes
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .build()?;
    Ok(client)
}

/// URL scheme of the REST endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
    /// Local (unix domain) socket; the transport does the routing
    Unix,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Unix => "unix",
        }
    }

    /// Scheme that goes on the wire; local sockets speak plain HTTP
    pub fn network_scheme(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http | Scheme::Unix => "http",
        }
    }

    pub fn is_local_socket(&self) -> bool {
        matches!(self, Scheme::Unix)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            "unix" => Ok(Scheme::Unix),
            other => Err(Error::RequestBuild(format!("Unsupported scheme: {}", other))),
        }
    }
}

/// Connection configuration for a REST client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL scheme
    pub scheme: Scheme,
    /// API host
    pub hostname: String,
    /// TCP port; 0 leaves the port out of URLs
    pub port: u16,
    /// Basic auth user; empty disables credentials in URLs
    pub user_id: String,
    /// Basic auth password
    #[serde(skip_serializing)]
    pub password: String,
    /// Log per-request timing at info level
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scheme: Scheme::Http,
            hostname: "localhost".to_string(),
            port: 0,
            user_id: String::new(),
            password: String::new(),
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration for a TCP endpoint
    pub fn new(scheme: Scheme, hostname: impl Into<String>, port: u16) -> Self {
        Config {
            scheme,
            hostname: hostname.into(),
            port,
            ..Config::default()
        }
    }

    /// Create a configuration for a local socket endpoint
    pub fn local_socket() -> Self {
        Config {
            scheme: Scheme::Unix,
            hostname: String::new(),
            port: 0,
            ..Config::default()
        }
    }

    /// Set basic auth credentials
    pub fn with_credentials(mut self, user_id: impl Into<String>, password: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self.password = password.into();
        self
    }

    /// Set debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load a configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scheme: {}, hostname: {}, port: {}",
            self.scheme, self.hostname, self.port
        )
    }
}
