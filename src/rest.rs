use crate::client::{create_rest_client, Config, Scheme};
use crate::error::{Error, GeneratedError, Result};
use crate::params::{self, ParameterDescriptor};
use crate::request::RequestBuilder;
use crate::response::{format_map, parse_to_map};
use crate::session::SessionInjector;
use reqwest::blocking::{multipart, Body, Client, Request, Response};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Maximum number of requests issued by a form post that keeps redirecting
pub const MAX_REDIRECTS: usize = 10;

/// Multipart field name of the uploaded file
pub const FILE_FIELD: &str = "filename";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Blocking REST client bound to one endpoint configuration.
///
/// Every send operation builds the URL from the configuration and an
/// endpoint name, dispatches exactly one request (form posts may follow
/// redirects) and returns the raw response. Reading and closing the body is
/// up to the caller.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    config: Config,
    session: Option<Arc<dyn SessionInjector>>,
}

impl RestClient {
    /// Create a client with the default transport
    pub fn new(config: Config) -> Result<Self> {
        Ok(RestClient {
            client: create_rest_client()?,
            config,
            session: None,
        })
    }

    /// Create a client for a TCP endpoint; empty `user_id` disables basic auth
    pub fn tcp(
        scheme: Scheme,
        hostname: &str,
        port: u16,
        user_id: &str,
        password: &str,
    ) -> Result<Self> {
        Self::new(Config::new(scheme, hostname, port).with_credentials(user_id, password))
    }

    /// Create a client for a local socket endpoint.
    ///
    /// URLs carry the placeholder host `fakehost.fak` and no port. The HTTP
    /// transport cannot dial a unix socket directly, so `transport` has to
    /// deliver requests for that host, typically through
    /// [`reqwest::Proxy`] pointing at a local forwarder for the socket.
    pub fn local_socket(transport: Client, user_id: &str, password: &str) -> Self {
        RestClient {
            client: transport,
            config: Config::local_socket().with_credentials(user_id, password),
            session: None,
        }
    }

    /// Replace the HTTP transport
    pub fn with_transport(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Set the capability used to attach session ids to requests
    pub fn with_session_injector(mut self, injector: impl SessionInjector + 'static) -> Self {
        self.session = Some(Arc::new(injector));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }

    pub fn scheme(&self) -> Scheme {
        self.config.scheme
    }

    pub fn hostname(&self) -> &str {
        &self.config.hostname
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    pub fn password(&self) -> &str {
        &self.config.password
    }

    /// URL for an endpoint, with basic auth credentials when configured
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        RequestBuilder::new(&self.config).url(endpoint)
    }

    /// Send a GET request
    pub fn send_get(&self, endpoint: &str) -> Result<Response> {
        self.send_bare(Method::GET, endpoint)
    }

    /// Send a HEAD request
    pub fn send_head(&self, endpoint: &str) -> Result<Response> {
        self.send_bare(Method::HEAD, endpoint)
    }

    /// Send a DELETE request
    pub fn send_delete(&self, endpoint: &str) -> Result<Response> {
        self.send_bare(Method::DELETE, endpoint)
    }

    /// POST url-encoded form fields, following redirects.
    ///
    /// 301, 302, 303, 307 and 308 responses are followed by re-posting the
    /// same body to the Location, for at most [`MAX_REDIRECTS`] requests in
    /// total. Any 2xx response is returned; other statuses become errors
    /// carrying the status line.
    pub fn send_form_post(&self, endpoint: &str, params: &[ParameterDescriptor]) -> Result<Response> {
        params::validate(params)?;
        let form = encode_form(params);
        let mut url = self.endpoint_url(endpoint)?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > MAX_REDIRECTS {
                return Err(Error::TooManyRedirects(MAX_REDIRECTS));
            }

            let request = self
                .client
                .post(url.clone())
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(form.clone())
                .build()?;
            let response = self.dispatch(request, "")?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }
            if !is_followed_redirect(status) {
                return Err(status_error(status));
            }

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            if location.is_empty() {
                return Err(Error::MissingLocation(status.as_u16()));
            }
            tracing::info!(status = status.as_u16(), location = %location, "Redirecting");
            url = url.join(location)?;
        }
    }

    /// POST url-encoded form fields with extra headers; redirects are not followed
    pub fn send_form_post_with_headers(
        &self,
        endpoint: &str,
        params: &[ParameterDescriptor],
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        params::validate(params)?;
        let url = self.endpoint_url(endpoint)?;

        for (name, value) in headers {
            tracing::debug!(header = %name, value = %value, "custom header");
        }
        let mut request = self.client.post(url).body(encode_form(params)).build()?;
        apply_headers(&mut request, headers)?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

        self.dispatch(request, "")
    }

    /// Upload a file as multipart form data using basic auth only
    pub fn send_basic_file_post(
        &self,
        endpoint: &str,
        params: &[ParameterDescriptor],
        path: impl AsRef<Path>,
    ) -> Result<Response> {
        self.send_file_post("", endpoint, params, path.as_ref())
    }

    /// Upload a file as multipart form data within a session
    pub fn send_session_file_post(
        &self,
        session_id: &str,
        endpoint: &str,
        params: &[ParameterDescriptor],
        path: impl AsRef<Path>,
    ) -> Result<Response> {
        self.send_file_post(session_id, endpoint, params, path.as_ref())
    }

    /// GET within a session; fields go into the query string
    pub fn send_session_get(
        &self,
        session_id: &str,
        endpoint: &str,
        params: &[ParameterDescriptor],
    ) -> Result<Response> {
        self.send_session_req(session_id, Method::GET, endpoint, params, &[])
    }

    /// POST url-encoded fields within a session
    pub fn send_session_post(
        &self,
        session_id: &str,
        endpoint: &str,
        params: &[ParameterDescriptor],
    ) -> Result<Response> {
        self.send_session_req(session_id, Method::POST, endpoint, params, &[])
    }

    /// Send form data with an arbitrary method and custom headers.
    ///
    /// GET and HEAD carry the fields in the query string, every other method
    /// sends them as a url-encoded body. POSTs without an explicit
    /// Content-Type get the form content type. A non-empty `session_id` is
    /// handed to the session injector after the request is built.
    pub fn send_session_req(
        &self,
        session_id: &str,
        method: Method,
        endpoint: &str,
        params: &[ParameterDescriptor],
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        params::validate(params)?;
        let mut url = self.endpoint_url(endpoint)?;

        let builder = if method == Method::GET || method == Method::HEAD {
            // Appended so a query already present in the endpoint name survives
            if !params.is_empty() {
                url.query_pairs_mut()
                    .extend_pairs(params.iter().map(|p| (p.name.as_str(), p.value.as_str())));
            }
            self.client.request(method, url)
        } else {
            self.client.request(method, url).body(encode_form(params))
        };

        let mut request = builder.build()?;
        apply_headers(&mut request, headers)?;
        default_form_content_type(&mut request);
        self.dispatch(request, session_id)
    }

    /// Send a raw body within a session, with the same header defaults as
    /// [`send_session_req`](Self::send_session_req)
    pub fn send_session_stream_req(
        &self,
        session_id: &str,
        method: Method,
        endpoint: &str,
        body: impl Into<Body>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let url = self.endpoint_url(endpoint)?;
        let mut request = self.client.request(method, url).body(body).build()?;
        apply_headers(&mut request, headers)?;
        default_form_content_type(&mut request);
        self.dispatch(request, session_id)
    }

    /// POST a raw body with caller-supplied headers
    pub fn send_basic_stream_post(
        &self,
        endpoint: &str,
        headers: &[(&str, &str)],
        body: impl Into<Body>,
    ) -> Result<Response> {
        self.send_basic_stream_req(Method::POST, endpoint, headers, body)
    }

    /// PUT a raw body with caller-supplied headers
    pub fn send_basic_stream_put(
        &self,
        endpoint: &str,
        headers: &[(&str, &str)],
        body: impl Into<Body>,
    ) -> Result<Response> {
        self.send_basic_stream_req(Method::PUT, endpoint, headers, body)
    }

    /// Send a raw body (bytes, a file, or `Body::new(reader)`) with the given method
    pub fn send_basic_stream_req(
        &self,
        method: Method,
        endpoint: &str,
        headers: &[(&str, &str)],
        body: impl Into<Body>,
    ) -> Result<Response> {
        let url = self.endpoint_url(endpoint)?;
        let mut request = self.client.request(method, url).body(body).build()?;
        apply_headers(&mut request, headers)?;
        self.dispatch(request, "")
    }

    /// Check for a 200 response, logging the body of anything else
    pub fn verify_ok(&self, response: Response) -> bool {
        let status = response.status();
        if status == StatusCode::OK {
            return true;
        }
        tracing::warn!(status = %status, "unexpected response status");
        if let Ok(map) = parse_to_map(response) {
            tracing::warn!("response body:\n{}", format_map(&map));
        }
        false
    }

    fn send_bare(&self, method: Method, endpoint: &str) -> Result<Response> {
        let url = self.endpoint_url(endpoint)?;
        let request = self.client.request(method, url).build()?;
        self.dispatch(request, "")
    }

    fn send_file_post(
        &self,
        session_id: &str,
        endpoint: &str,
        params: &[ParameterDescriptor],
        path: &Path,
    ) -> Result<Response> {
        params::validate(params)?;
        let url = self.endpoint_url(endpoint)?;
        let form = multipart_form(path, params)?;
        let request = self.client.post(url).multipart(form).build()?;
        self.dispatch(request, session_id)
    }

    /// Inject the session, if any, and execute
    fn dispatch(&self, request: Request, session_id: &str) -> Result<Response> {
        let request = if session_id.is_empty() {
            request
        } else {
            let injector = self.session.as_ref().ok_or(Error::NoSessionInjector)?;
            injector.apply_session(request, session_id)?
        };

        let method = request.method().clone();
        let url = request.url().clone();
        let start = Instant::now();

        let response = self.client.execute(request)?;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();
        if self.config.debug {
            tracing::info!(%method, %url, status, ?elapsed, "request complete");
        } else {
            tracing::debug!(%method, %url, status, ?elapsed, "request complete");
        }
        Ok(response)
    }
}

impl fmt::Display for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RestClient: {}", self.config)
    }
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Classified error carrying the status line
fn status_error(status: StatusCode) -> Error {
    let line = status.to_string();
    match GeneratedError::from_status(status.as_u16(), &line) {
        Some(err) => err.into(),
        None => GeneratedError::server(line).into(),
    }
}

fn encode_form(params: &[ParameterDescriptor]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|p| (p.name.as_str(), p.value.as_str())))
        .finish()
}

/// Set caller headers, replacing earlier values of the same name
fn apply_headers(request: &mut Request, headers: &[(&str, &str)]) -> Result<()> {
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::RequestBuild(format!("invalid header name {:?}: {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::RequestBuild(format!("invalid value for header {}: {}", name, e)))?;
        request.headers_mut().insert(header_name, header_value);
    }
    Ok(())
}

/// POSTs without a Content-Type are sent as form data
fn default_form_content_type(request: &mut Request) {
    if *request.method() == Method::POST && !request.headers().contains_key(CONTENT_TYPE) {
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    }
}

/// One file part named [`FILE_FIELD`], then one text part per parameter.
/// The file is read fully up front and closed before anything is sent.
fn multipart_form(path: &Path, params: &[ParameterDescriptor]) -> Result<multipart::Form> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| GeneratedError::user(format!("{} does not name a file", path.display())))?;
    let contents = std::fs::read(path)?;

    let part = multipart::Part::bytes(contents)
        .file_name(file_name)
        .mime_str("application/octet-stream")?;
    let mut form = multipart::Form::new().part(FILE_FIELD, part);
    for param in params {
        form = form.text(param.name.clone(), param.value.clone());
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_user_error;

    fn client() -> RestClient {
        RestClient::tcp(Scheme::Http, "127.0.0.1", 9, "u", "p").unwrap()
    }

    #[test]
    fn test_rest_client_creation() {
        let client = client();
        assert_eq!(client.scheme(), Scheme::Http);
        assert_eq!(client.hostname(), "127.0.0.1");
        assert_eq!(client.port(), 9);
        assert_eq!(client.user_id(), "u");
        assert_eq!(client.password(), "p");
        assert_eq!(client.to_string(), "RestClient: scheme: http, hostname: 127.0.0.1, port: 9");
        assert_eq!(client.endpoint_url("foo").unwrap().as_str(), "http://u:p@127.0.0.1:9/foo");
    }

    #[test]
    fn test_local_socket_client() {
        let transport = create_rest_client().unwrap();
        let client = RestClient::local_socket(transport, "", "");
        assert_eq!(client.endpoint_url("ping").unwrap().as_str(), "http://fakehost.fak/ping");
    }

    #[test]
    fn test_encode_form() {
        let params = vec![
            ParameterDescriptor::new("name", "a b"),
            ParameterDescriptor::new("q", "x&y=z"),
        ];
        assert_eq!(encode_form(&params), "name=a+b&q=x%26y%3Dz");
    }

    fn built(method: Method) -> Request {
        create_rest_client()
            .unwrap()
            .request(method, "http://localhost/foo")
            .build()
            .unwrap()
    }

    #[test]
    fn test_apply_headers_replaces_repeated_names() {
        let mut request = built(Method::PUT);
        apply_headers(&mut request, &[("X-Tag", "first"), ("x-tag", "second")]).unwrap();
        let values: Vec<_> = request
            .headers()
            .get_all("x-tag")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["second"]);
    }

    #[test]
    fn test_apply_headers_rejects_bad_name() {
        let mut request = built(Method::PUT);
        let err = apply_headers(&mut request, &[("bad header", "v")]).unwrap_err();
        assert!(matches!(err, Error::RequestBuild(_)));
    }

    #[test]
    fn test_default_form_content_type() {
        let mut post = built(Method::POST);
        default_form_content_type(&mut post);
        assert_eq!(post.headers()[CONTENT_TYPE], FORM_CONTENT_TYPE);

        let mut typed = built(Method::POST);
        apply_headers(&mut typed, &[("content-type", "text/plain")]).unwrap();
        default_form_content_type(&mut typed);
        assert_eq!(typed.headers()[CONTENT_TYPE], "text/plain");

        let mut put = built(Method::PUT);
        default_form_content_type(&mut put);
        assert!(!put.headers().contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_redirect_statuses() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_followed_redirect(StatusCode::from_u16(code).unwrap()));
        }
        assert!(!is_followed_redirect(StatusCode::NOT_MODIFIED));
        assert!(!is_followed_redirect(StatusCode::OK));
    }

    #[test]
    fn test_status_error_carries_status_line() {
        let err = status_error(StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "404 Not Found");
        assert!(is_user_error(&err));
    }

    #[test]
    fn test_empty_parameter_name_fails_before_sending() {
        let params = [ParameterDescriptor::new("", "x")];
        assert!(client().send_form_post("foo", &params).is_err());
        assert!(client().send_session_post("sid", "foo", &params).is_err());
    }

    #[test]
    fn test_session_without_injector() {
        let err = client().send_session_get("sid", "foo", &[]).unwrap_err();
        assert!(matches!(err, Error::NoSessionInjector));
    }

    #[test]
    fn test_missing_upload_file() {
        let err = client()
            .send_basic_file_post("upload", &[], "/definitely/not/here.bin")
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_bad_hostname_fails_url_construction() {
        let client = RestClient::tcp(Scheme::Http, "bad host", 0, "", "").unwrap();
        assert!(matches!(client.send_get("foo"), Err(Error::UrlParse(_))));
    }
}
