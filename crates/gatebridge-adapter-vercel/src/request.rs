use std::fmt;

use gatebridge_core::environ::Environ;
use gatebridge_core::gateway::StartResponse;
use serde_json::Value;

/// A request that carries what the gateway convention needs: the environment mapping and the
/// caller's response-start callable.
pub struct GatewayRequest<'a> {
    environ: Environ,
    start_response: &'a mut dyn StartResponse,
}

impl<'a> GatewayRequest<'a> {
    pub fn new(environ: Environ, start_response: &'a mut dyn StartResponse) -> Self {
        Self {
            environ,
            start_response,
        }
    }

    pub fn environ(&self) -> &Environ {
        &self.environ
    }

    pub fn into_parts(self) -> (Environ, &'a mut dyn StartResponse) {
        (self.environ, self.start_response)
    }
}

/// Inbound request as delivered by the host, classified once at the boundary.
pub enum HostRequest<'a> {
    Gateway(GatewayRequest<'a>),
    /// Anything that does not expose an environment mapping.
    Opaque(Value),
}

impl<'a> HostRequest<'a> {
    pub fn gateway(environ: Environ, start_response: &'a mut dyn StartResponse) -> Self {
        HostRequest::Gateway(GatewayRequest::new(environ, start_response))
    }

    pub fn opaque(payload: Value) -> Self {
        HostRequest::Opaque(payload)
    }

    /// Classify a JSON invocation payload.
    ///
    /// An object with an `environ` object becomes a gateway request: string values are taken as
    /// is, numbers and booleans are stringified, and other values are dropped. An optional `body`
    /// string becomes the input stream. Every other payload is opaque.
    pub fn from_event(event: Value, start_response: &'a mut dyn StartResponse) -> Self {
        let Some(vars) = event.get("environ").and_then(Value::as_object) else {
            return HostRequest::Opaque(event);
        };

        let mut environ = Environ::new();
        for (key, value) in vars {
            let value = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                _ => {
                    log::debug!("dropping non-scalar environ entry `{}`", key);
                    continue;
                }
            };
            environ.insert(key.clone(), value);
        }

        if let Some(body) = event.get("body").and_then(Value::as_str) {
            environ = environ.with_input(body.to_string());
        }

        HostRequest::gateway(environ, start_response)
    }

    pub fn is_gateway(&self) -> bool {
        matches!(self, HostRequest::Gateway(_))
    }
}

impl fmt::Debug for HostRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostRequest::Gateway(request) => f
                .debug_struct("HostRequest::Gateway")
                .field("environ", request.environ())
                .finish_non_exhaustive(),
            HostRequest::Opaque(payload) => {
                f.debug_tuple("HostRequest::Opaque").field(payload).finish()
            }
        }
    }
}
