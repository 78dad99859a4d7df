//! # harbor-utils - REST client wrapper and small utilities
//!
//! A blocking client for REST services that speak form-encoded requests
//! and answer with JSON, together with a handful of standalone helpers.
//!
//! ## Features
//!
//! - URL assembly from scheme, host, port, basic-auth credentials and an
//!   endpoint name, including local-socket endpoints
//! - GET / HEAD / DELETE, form posts with bounded redirect following,
//!   multipart file uploads and raw stream bodies
//! - Session ids attached through a caller-supplied [`SessionInjector`]
//! - JSON response parsing into maps, arrays of maps, or the
//!   `{HTTPStatusCode, HTTPReasonPhrase, payload}` [`Envelope`]
//! - Errors classified as user- or server-caused ([`ErrorKind`])
//! - Helpers: list utilities, temp files, file digests, local IP discovery,
//!   SMTP email
//!
//! ## Basic Usage
//!
//! ```no_run
//! use harbor_utils::{parse_to_envelope, ParameterDescriptor, RestClient, Scheme};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RestClient::tcp(Scheme::Http, "localhost", 8080, "admin", "secret")?;
//!
//!     let response = client.send_form_post(
//!         "getUserDesc",
//!         &[ParameterDescriptor::new("UserId", "123")],
//!     )?;
//!
//!     let envelope = parse_to_envelope(response)?;
//!     for item in &envelope.payload {
//!         println!("{:?}", item);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Sessions
//!
//! ```no_run
//! use harbor_utils::{Config, CookieSession, RestClient, Scheme};
//!
//! let client = RestClient::new(Config::new(Scheme::Https, "api.example.com", 0))?
//!     .with_session_injector(CookieSession::new("SessionId"));
//!
//! let response = client.send_session_get("3f2a9c", "getMyGroups", &[])?;
//! # Ok::<(), harbor_utils::Error>(())
//! ```

pub mod client;
pub mod codec;
pub mod crypto;
pub mod email;
pub mod error;
pub mod files;
pub mod internet;
pub mod lists;
pub mod params;
pub mod request;
pub mod response;
pub mod rest;
pub mod session;

// Re-export main types for convenience
pub use client::{create_rest_client, Config, Scheme};
pub use email::EmailService;
pub use error::{is_server_error, is_user_error, Error, ErrorKind, GeneratedError, Result};
pub use params::{ParameterDescriptor, ParameterInfo};
pub use request::RequestBuilder;
pub use response::{
    parse_to_envelope, parse_to_map, parse_to_maps, parse_to_payload_maps, Envelope, JsonMap,
};
pub use rest::{RestClient, MAX_REDIRECTS};
pub use session::{CookieSession, HeaderSession, SessionInjector};

// Re-export the HTTP types that appear in the client API
pub use reqwest::blocking::{Body, Response};
pub use reqwest::Method;
