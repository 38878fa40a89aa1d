//! Environment mapping handed to gateway applications.
//!
//! The mapping follows the synchronous web-gateway convention: CGI-style request metadata keys,
//! one `HTTP_*` key per request header, and the request body carried alongside as the input
//! stream.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::BridgeError;
use crate::http::{header, HeaderMap, Request, Uri};

pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
pub const PATH_INFO: &str = "PATH_INFO";
pub const QUERY_STRING: &str = "QUERY_STRING";
pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";
pub const SERVER_NAME: &str = "SERVER_NAME";
pub const SERVER_PORT: &str = "SERVER_PORT";
pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
pub const URL_SCHEME: &str = "wsgi.url_scheme";

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const DEFAULT_SERVER_NAME: &str = "localhost";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environ {
    vars: BTreeMap<String, String>,
    input: Bytes,
}

impl Environ {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            input: Bytes::new(),
        }
    }

    /// Build the mapping for an HTTP request, draining its body into the input stream.
    pub async fn from_request(request: Request) -> Result<Self, BridgeError> {
        let (parts, body) = request.into_parts();
        let input = body.collect().await.map_err(BridgeError::internal)?;
        Ok(Self::from_parts(
            &parts.method,
            &parts.uri,
            parts.version,
            &parts.headers,
            input,
        ))
    }

    pub fn from_parts(
        method: &http::Method,
        uri: &Uri,
        version: http::Version,
        headers: &HeaderMap,
        input: Bytes,
    ) -> Self {
        let mut vars = BTreeMap::new();

        vars.insert(REQUEST_METHOD.to_string(), method.as_str().to_string());
        vars.insert(SCRIPT_NAME.to_string(), String::new());
        vars.insert(PATH_INFO.to_string(), uri.path().to_string());
        vars.insert(
            QUERY_STRING.to_string(),
            uri.query().unwrap_or("").to_string(),
        );
        vars.insert(
            SERVER_PROTOCOL.to_string(),
            protocol_name(version).to_string(),
        );

        let scheme = url_scheme(uri, headers);
        let (server_name, server_port) = server_address(uri, headers, &scheme);
        vars.insert(SERVER_NAME.to_string(), server_name);
        vars.insert(SERVER_PORT.to_string(), server_port);
        vars.insert(URL_SCHEME.to_string(), scheme);

        if let Some(value) = header_string(headers, &header::CONTENT_TYPE) {
            vars.insert(CONTENT_TYPE.to_string(), value);
        }
        match header_string(headers, &header::CONTENT_LENGTH) {
            Some(value) => {
                vars.insert(CONTENT_LENGTH.to_string(), value);
            }
            None if !input.is_empty() => {
                vars.insert(CONTENT_LENGTH.to_string(), input.len().to_string());
            }
            None => {}
        }

        for name in headers.keys() {
            if *name == header::CONTENT_TYPE || *name == header::CONTENT_LENGTH {
                continue;
            }
            let joined = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            vars.insert(http_key(name.as_str()), joined);
        }

        Self { vars, input }
    }

    #[must_use]
    pub fn with_input<B>(mut self, input: B) -> Self
    where
        B: Into<Bytes>,
    {
        self.input = input.into();
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn input(&self) -> &Bytes {
        &self.input
    }

    pub fn method(&self) -> Option<&str> {
        self.get(REQUEST_METHOD)
    }

    pub fn path_info(&self) -> Option<&str> {
        self.get(PATH_INFO)
    }

    pub fn query_string(&self) -> Option<&str> {
        self.get(QUERY_STRING)
    }

    /// Look up a request header by its HTTP name (`user-agent` reads `HTTP_USER_AGENT`).
    pub fn header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("content-type") {
            return self.get(CONTENT_TYPE);
        }
        if name.eq_ignore_ascii_case("content-length") {
            return self.get(CONTENT_LENGTH);
        }
        self.get(&http_key(name))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// `x-forwarded-for` becomes `HTTP_X_FORWARDED_FOR`.
pub fn http_key(header_name: &str) -> String {
    let mut key = String::with_capacity(header_name.len() + 5);
    key.push_str("HTTP_");
    for ch in header_name.chars() {
        if ch == '-' {
            key.push('_');
        } else {
            key.push(ch.to_ascii_uppercase());
        }
    }
    key
}

fn header_string(headers: &HeaderMap, name: &header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

fn protocol_name(version: http::Version) -> &'static str {
    match version {
        http::Version::HTTP_09 => "HTTP/0.9",
        http::Version::HTTP_10 => "HTTP/1.0",
        http::Version::HTTP_2 => "HTTP/2",
        http::Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/1.1",
    }
}

fn url_scheme(uri: &Uri, headers: &HeaderMap) -> String {
    if let Some(scheme) = uri.scheme_str() {
        return scheme.to_ascii_lowercase();
    }
    headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(|proto| proto.trim().to_ascii_lowercase())
        .filter(|proto| !proto.is_empty())
        .unwrap_or_else(|| "http".to_string())
}

fn server_address(uri: &Uri, headers: &HeaderMap, scheme: &str) -> (String, String) {
    let default_port = if scheme == "https" { "443" } else { "80" };

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty());

    if let Some(host) = host {
        return split_host_port(host, default_port);
    }

    match uri.host() {
        Some(host) => (
            host.to_string(),
            uri.port_u16()
                .map(|port| port.to_string())
                .unwrap_or_else(|| default_port.to_string()),
        ),
        None => (DEFAULT_SERVER_NAME.to_string(), default_port.to_string()),
    }
}

fn split_host_port(host: &str, default_port: &str) -> (String, String) {
    // Bracketed IPv6 literals carry colons inside the address.
    if let Some(rest) = host.strip_prefix('[') {
        if let Some((addr, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .filter(|port| port.parse::<u16>().is_ok())
                .unwrap_or(default_port);
            return (format!("[{addr}]"), port.to_string());
        }
    }

    match host.rsplit_once(':') {
        Some((name, port)) if port.parse::<u16>().is_ok() => {
            (name.to_string(), port.to_string())
        }
        _ => (host.to_string(), default_port.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::http::{request_builder, Method};
    use futures::executor::block_on;

    fn environ_for(request: Request) -> Environ {
        block_on(Environ::from_request(request)).expect("environ")
    }

    #[test]
    fn maps_request_line_into_cgi_keys() {
        let request = request_builder()
            .method(Method::POST)
            .uri("/submit/form?page=2&sort=asc")
            .header("host", "example.com:8080")
            .body(Body::empty())
            .expect("request");

        let environ = environ_for(request);
        assert_eq!(environ.method(), Some("POST"));
        assert_eq!(environ.path_info(), Some("/submit/form"));
        assert_eq!(environ.query_string(), Some("page=2&sort=asc"));
        assert_eq!(environ.get(SCRIPT_NAME), Some(""));
        assert_eq!(environ.get(SERVER_NAME), Some("example.com"));
        assert_eq!(environ.get(SERVER_PORT), Some("8080"));
        assert_eq!(environ.get(SERVER_PROTOCOL), Some("HTTP/1.1"));
        assert_eq!(environ.get(URL_SCHEME), Some("http"));
    }

    #[test]
    fn query_string_is_empty_when_absent() {
        let request = request_builder()
            .uri("/")
            .body(Body::empty())
            .expect("request");
        let environ = environ_for(request);
        assert_eq!(environ.query_string(), Some(""));
        assert_eq!(environ.get(SERVER_NAME), Some("localhost"));
        assert_eq!(environ.get(SERVER_PORT), Some("80"));
    }

    #[test]
    fn headers_become_http_keys_and_repeats_are_joined() {
        let request = request_builder()
            .uri("/")
            .header("user-agent", "curl/8.0")
            .header("x-forwarded-for", "10.0.0.1")
            .header("accept", "text/html")
            .header("accept", "application/json")
            .body(Body::empty())
            .expect("request");

        let environ = environ_for(request);
        assert_eq!(environ.get("HTTP_USER_AGENT"), Some("curl/8.0"));
        assert_eq!(environ.get("HTTP_X_FORWARDED_FOR"), Some("10.0.0.1"));
        assert_eq!(
            environ.get("HTTP_ACCEPT"),
            Some("text/html,application/json")
        );
        assert_eq!(environ.header("User-Agent"), Some("curl/8.0"));
    }

    #[test]
    fn content_headers_are_not_duplicated_as_http_keys() {
        let request = request_builder()
            .method(Method::POST)
            .uri("/echo")
            .header("content-type", "application/json")
            .header("content-length", "12")
            .body(Body::from(r#"{"name":"a"}"#))
            .expect("request");

        let environ = environ_for(request);
        assert_eq!(environ.get(CONTENT_TYPE), Some("application/json"));
        assert_eq!(environ.get(CONTENT_LENGTH), Some("12"));
        assert!(!environ.contains_key("HTTP_CONTENT_TYPE"));
        assert!(!environ.contains_key("HTTP_CONTENT_LENGTH"));
        assert_eq!(environ.header("content-type"), Some("application/json"));
    }

    #[test]
    fn body_is_collected_into_input_with_derived_length() {
        let request = request_builder()
            .method(Method::POST)
            .uri("/echo")
            .body(Body::from("payload"))
            .expect("request");

        let environ = environ_for(request);
        assert_eq!(environ.input().as_ref(), b"payload");
        assert_eq!(environ.get(CONTENT_LENGTH), Some("7"));
    }

    #[test]
    fn forwarded_proto_selects_https_defaults() {
        let request = request_builder()
            .uri("/")
            .header("host", "app.example.com")
            .header("x-forwarded-proto", "https")
            .body(Body::empty())
            .expect("request");

        let environ = environ_for(request);
        assert_eq!(environ.get(URL_SCHEME), Some("https"));
        assert_eq!(environ.get(SERVER_PORT), Some("443"));
        assert_eq!(environ.get(SERVER_NAME), Some("app.example.com"));
    }

    #[test]
    fn absolute_uri_supplies_server_address_without_host_header() {
        let request = request_builder()
            .uri("https://example.org:9443/path")
            .body(Body::empty())
            .expect("request");

        let environ = environ_for(request);
        assert_eq!(environ.get(URL_SCHEME), Some("https"));
        assert_eq!(environ.get(SERVER_NAME), Some("example.org"));
        assert_eq!(environ.get(SERVER_PORT), Some("9443"));
    }

    #[test]
    fn split_host_port_handles_ipv6_literals() {
        assert_eq!(
            split_host_port("[::1]:3000", "80"),
            ("[::1]".to_string(), "3000".to_string())
        );
        assert_eq!(
            split_host_port("[::1]", "80"),
            ("[::1]".to_string(), "80".to_string())
        );
    }

    #[test]
    fn from_vars_builds_plain_mapping() {
        let environ = Environ::from_vars([("REQUEST_METHOD", "GET"), ("PATH_INFO", "/")])
            .with_input("body");
        assert_eq!(environ.len(), 2);
        assert_eq!(environ.method(), Some("GET"));
        assert_eq!(environ.input().as_ref(), b"body");
    }

    #[test]
    fn http_key_normalises_header_names() {
        assert_eq!(http_key("x-request-id"), "HTTP_X_REQUEST_ID");
        assert_eq!(http_key("Accept"), "HTTP_ACCEPT");
    }
}
