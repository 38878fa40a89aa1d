//! The synchronous gateway calling convention: an application receives an [`Environ`] and a
//! response-start callable, announces status and headers through the callable, and returns the
//! response body as a sequence of byte chunks.

use bytes::{Bytes, BytesMut};

use crate::body::Body;
use crate::environ::Environ;
use crate::error::BridgeError;
use crate::http::{response_builder, HeaderName, HeaderValue, Response, StatusCode};

pub type HeaderList = Vec<(String, String)>;

/// Response-start callable supplied by the caller of a gateway application.
pub trait StartResponse {
    fn start(&mut self, status: &str, headers: HeaderList) -> Result<(), BridgeError>;
}

impl<F> StartResponse for F
where
    F: FnMut(&str, HeaderList) -> Result<(), BridgeError>,
{
    fn start(&mut self, status: &str, headers: HeaderList) -> Result<(), BridgeError> {
        (self)(status, headers)
    }
}

/// Body chunks produced by a gateway application, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppOutput {
    chunks: Vec<Bytes>,
}

impl AppOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push<B>(&mut self, chunk: B)
    where
        B: Into<Bytes>,
    {
        self.chunks.push(chunk.into());
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(Bytes::is_empty)
    }

    pub fn concat(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.chunks.iter().map(Bytes::len).sum());
        for chunk in &self.chunks {
            buf.extend_from_slice(chunk);
        }
        buf.freeze()
    }
}

impl IntoIterator for AppOutput {
    type Item = Bytes;
    type IntoIter = std::vec::IntoIter<Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

impl From<Bytes> for AppOutput {
    fn from(value: Bytes) -> Self {
        Self {
            chunks: vec![value],
        }
    }
}

impl From<&'static str> for AppOutput {
    fn from(value: &'static str) -> Self {
        Self::from(Bytes::from_static(value.as_bytes()))
    }
}

impl From<String> for AppOutput {
    fn from(value: String) -> Self {
        Self::from(Bytes::from(value))
    }
}

impl From<Vec<u8>> for AppOutput {
    fn from(value: Vec<u8>) -> Self {
        Self::from(Bytes::from(value))
    }
}

/// Application callable under the gateway convention.
pub trait GatewayApp: Send + Sync {
    fn call(
        &self,
        environ: &Environ,
        start_response: &mut dyn StartResponse,
    ) -> Result<AppOutput, BridgeError>;
}

impl<F> GatewayApp for F
where
    F: Fn(&Environ, &mut dyn StartResponse) -> Result<AppOutput, BridgeError> + Send + Sync,
{
    fn call(
        &self,
        environ: &Environ,
        start_response: &mut dyn StartResponse,
    ) -> Result<AppOutput, BridgeError> {
        (self)(environ, start_response)
    }
}

/// Response-start callable that records what the application announced so the host side can
/// assemble an HTTP response afterwards.
#[derive(Debug, Default)]
pub struct ResponseCollector {
    started: Option<(StatusCode, HeaderList)>,
}

impl ResponseCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started.is_some()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.started.as_ref().map(|(status, _)| *status)
    }

    pub fn headers(&self) -> Option<&HeaderList> {
        self.started.as_ref().map(|(_, headers)| headers)
    }

    pub fn into_response(self, output: AppOutput) -> Result<Response, BridgeError> {
        let (status, headers) = self.started.ok_or_else(|| {
            BridgeError::start_response("application never called start_response")
        })?;

        let mut builder = response_builder().status(status);
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                BridgeError::start_response(format!("invalid header name `{name}`: {err}"))
            })?;
            let value = HeaderValue::from_str(&value).map_err(|err| {
                BridgeError::start_response(format!("invalid header value for `{name}`: {err}"))
            })?;
            builder = builder.header(name, value);
        }

        builder
            .body(Body::from_bytes(output.concat()))
            .map_err(BridgeError::internal)
    }
}

impl StartResponse for ResponseCollector {
    fn start(&mut self, status: &str, headers: HeaderList) -> Result<(), BridgeError> {
        if self.started.is_some() {
            return Err(BridgeError::start_response("response already started"));
        }
        let status = parse_status_line(status)?;
        self.started = Some((status, headers));
        Ok(())
    }
}

/// Parse `"200 OK"` (or a bare `"204"`) into a status code.
pub fn parse_status_line(line: &str) -> Result<StatusCode, BridgeError> {
    let code = line.trim_start().split(' ').next().unwrap_or("");
    if code.len() != 3 {
        return Err(BridgeError::start_response(format!(
            "invalid status line `{line}`"
        )));
    }
    StatusCode::from_bytes(code.as_bytes())
        .map_err(|_| BridgeError::start_response(format!("invalid status line `{line}`")))
}
