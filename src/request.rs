use crate::client::{Config, LOCAL_SOCKET_HOST};
use crate::error::Result;
use url::Url;

/// Builds target URLs for logical endpoint names.
///
/// URLs have the shape `scheme://[user:password@]host[:port]/endpoint`. The
/// endpoint name is interpolated as-is; callers must escape it themselves
/// if it can contain reserved characters.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    config: &'a Config,
    basic_auth: bool,
}

impl<'a> RequestBuilder<'a> {
    /// Create a builder that embeds basic auth credentials when configured
    pub fn new(config: &'a Config) -> Self {
        RequestBuilder {
            config,
            basic_auth: true,
        }
    }

    /// Enable or disable credentials in the URL
    pub fn basic_auth(mut self, basic_auth: bool) -> Self {
        self.basic_auth = basic_auth;
        self
    }

    /// Render the URL for an endpoint without validating it
    pub fn url_string(&self, endpoint: &str) -> String {
        let config = self.config;

        let creds = if self.basic_auth && !config.user_id.is_empty() {
            format!("{}:{}@", config.user_id, config.password)
        } else {
            String::new()
        };

        let port = if config.port != 0 {
            format!(":{}", config.port)
        } else {
            String::new()
        };

        // Local sockets are routed by the transport, not by DNS
        let hostname = if config.scheme.is_local_socket() {
            LOCAL_SOCKET_HOST
        } else {
            config.hostname.as_str()
        };

        format!(
            "{}://{}{}{}/{}",
            config.scheme.network_scheme(),
            creds,
            hostname,
            port,
            endpoint
        )
    }

    /// Render and parse the URL for an endpoint
    pub fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(Url::parse(&self.url_string(endpoint))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Scheme;

    #[test]
    fn test_url_with_credentials_and_port() {
        let config = Config::new(Scheme::Http, "example.com", 8080).with_credentials("u", "p");
        let builder = RequestBuilder::new(&config);
        assert_eq!(builder.url_string("foo"), "http://u:p@example.com:8080/foo");
        assert_eq!(builder.url("foo").unwrap().as_str(), "http://u:p@example.com:8080/foo");
    }

    #[test]
    fn test_url_without_port() {
        let config = Config::new(Scheme::Http, "example.com", 0).with_credentials("u", "p");
        assert_eq!(
            RequestBuilder::new(&config).url_string("foo"),
            "http://u:p@example.com/foo"
        );
    }

    #[test]
    fn test_url_without_user() {
        let config = Config::new(Scheme::Https, "example.com", 8443).with_credentials("", "p");
        assert_eq!(
            RequestBuilder::new(&config).url_string("foo"),
            "https://example.com:8443/foo"
        );
    }

    #[test]
    fn test_url_basic_auth_disabled() {
        let config = Config::new(Scheme::Http, "example.com", 80).with_credentials("u", "p");
        assert_eq!(
            RequestBuilder::new(&config).basic_auth(false).url_string("a/b"),
            "http://example.com:80/a/b"
        );
    }

    #[test]
    fn test_url_local_socket() {
        let config = Config::local_socket().with_credentials("u", "p");
        assert_eq!(
            RequestBuilder::new(&config).url_string("ping"),
            "http://u:p@fakehost.fak/ping"
        );
    }

    #[test]
    fn test_url_parse_failure() {
        let config = Config::new(Scheme::Http, "bad host", 0);
        assert!(RequestBuilder::new(&config).url("foo").is_err());
    }
}
