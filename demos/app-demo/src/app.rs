use std::sync::Arc;

use gatebridge_core::app::{App, Hooks};
use gatebridge_core::environ::Environ;
use gatebridge_core::error::BridgeError;
use gatebridge_core::gateway::{AppOutput, GatewayApp, StartResponse};

use crate::handlers::{echo, environ, headers, not_found, root, stream};

type Handler = fn(&Environ, &mut dyn StartResponse) -> Result<AppOutput, BridgeError>;

/// Dispatches on `REQUEST_METHOD` and `PATH_INFO`.
pub struct DemoRoutes;

impl DemoRoutes {
    fn route(method: &str, path: &str) -> Handler {
        match (method, path) {
            ("GET", "/") => root,
            ("GET", "/headers") => headers,
            ("GET", "/stream") => stream,
            ("GET", "/environ") => environ,
            ("GET", path) if path.starts_with("/echo/") => echo,
            _ => not_found,
        }
    }
}

impl GatewayApp for DemoRoutes {
    fn call(
        &self,
        environ: &Environ,
        start_response: &mut dyn StartResponse,
    ) -> Result<AppOutput, BridgeError> {
        let method = environ.method().unwrap_or("GET");
        let path = environ.path_info().unwrap_or("/");
        let handler = Self::route(method, path);
        log::debug!("demo routing {} {}", method, path);
        handler(environ, start_response)
    }
}

pub struct DemoApp;

impl Hooks for DemoApp {
    fn gateway() -> Arc<dyn GatewayApp> {
        Arc::new(DemoRoutes)
    }

    fn name() -> &'static str {
        "Gatebridge Demo"
    }
}

pub(crate) fn build() -> Result<App, BridgeError> {
    Ok(DemoApp::build_app())
}
