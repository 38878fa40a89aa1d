use std::path::{Path, PathBuf};

use futures::executor;
use gatebridge_adapter::{ModuleResolver, SearchPath};
use gatebridge_core::app::App;
use gatebridge_core::environ::Environ;
use gatebridge_core::error::BridgeError;
use gatebridge_core::gateway::{AppOutput, ResponseCollector};
use gatebridge_core::http::{Request, Response};
use gatebridge_core::manifest::ManifestLoader;
use gatebridge_core::response::IntoResponse;

use crate::request::HostRequest;

/// Module resolved when the configuration does not name one.
pub const DEFAULT_MODULE: &str = "app";

/// Where the adapter lives and which module it wraps.
#[derive(Clone, Debug)]
pub struct AdapterConfig {
    location: PathBuf,
    module: String,
    search_path: SearchPath,
}

impl AdapterConfig {
    /// `location` is the adapter's own file; the module is looked up one directory above the
    /// directory containing it.
    pub fn new<P>(location: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            location: location.into(),
            module: DEFAULT_MODULE.to_string(),
            search_path: SearchPath::new(),
        }
    }

    #[must_use]
    pub fn with_module<S>(mut self, module: S) -> Self
    where
        S: Into<String>,
    {
        self.module = module.into();
        self
    }

    /// Additional directory consulted after the adapter root.
    #[must_use]
    pub fn with_search_path_entry<P>(mut self, dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.search_path.append(dir);
        self
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn module(&self) -> &str {
        &self.module
    }
}

/// Outcome of [`Adapter::dispatch`].
#[derive(Debug)]
pub enum Dispatch {
    /// The wrapped application ran; its output is returned as produced.
    Invoked(AppOutput),
    /// The request carried no environment, so the wrapped application itself is handed back.
    Passthrough(App),
}

impl Dispatch {
    pub fn is_invoked(&self) -> bool {
        matches!(self, Dispatch::Invoked(_))
    }

    pub fn into_output(self) -> Option<AppOutput> {
        match self {
            Dispatch::Invoked(output) => Some(output),
            Dispatch::Passthrough(_) => None,
        }
    }

    pub fn into_app(self) -> Option<App> {
        match self {
            Dispatch::Invoked(_) => None,
            Dispatch::Passthrough(app) => Some(app),
        }
    }
}

/// Serverless entry point wrapping a resolved application.
///
/// Immutable after [`Adapter::initialize`]; clones share the same application and may be used
/// from any number of concurrent invocations.
#[derive(Clone)]
pub struct Adapter {
    app: App,
    module: Option<String>,
    search_path: SearchPath,
    manifest: ManifestLoader,
}

impl Adapter {
    /// Extend the search path with the adapter root and resolve the configured module.
    ///
    /// A module that cannot be found or fails to load is fatal: no adapter is produced.
    pub fn initialize(config: AdapterConfig) -> Result<Self, BridgeError> {
        let AdapterConfig {
            location,
            module,
            mut search_path,
        } = config;

        search_path.prepend_parent_of(&location).map_err(|err| {
            BridgeError::module_load(
                &module,
                format!("cannot derive search path from {}: {err}", location.display()),
            )
        })?;

        let resolved = ModuleResolver::new(&search_path).resolve(&module)?;
        let manifest = resolved.manifest().clone();
        let app = resolved.into_app();

        Ok(Self {
            app,
            module: Some(module),
            search_path,
            manifest,
        })
    }

    /// Wrap an application that was built without going through module resolution. Such an
    /// adapter has no module name and an empty search path.
    pub fn from_app(app: App) -> Self {
        Self {
            app,
            module: None,
            search_path: SearchPath::new(),
            manifest: ManifestLoader::default(),
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Name of the resolved module; `None` for adapters built with [`Adapter::from_app`].
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn manifest(&self) -> &ManifestLoader {
        &self.manifest
    }

    /// Forward a host request to the wrapped application.
    ///
    /// Errors raised by the application are returned unchanged.
    pub fn dispatch(&self, request: HostRequest<'_>) -> Result<Dispatch, BridgeError> {
        match request {
            HostRequest::Gateway(request) => {
                let (environ, start_response) = request.into_parts();
                log::debug!(
                    "dispatching {} {} to `{}`",
                    environ.method().unwrap_or("-"),
                    environ.path_info().unwrap_or("-"),
                    self.app.name()
                );
                self.app
                    .call(&environ, start_response)
                    .map(Dispatch::Invoked)
            }
            HostRequest::Opaque(_) => {
                log::warn!(
                    "request without an environment; handing back app `{}` uninvoked",
                    self.app.name()
                );
                Ok(Dispatch::Passthrough(self.app.clone()))
            }
        }
    }

    /// Serve an HTTP request through the wrapped application. Failures are rendered as JSON
    /// error responses.
    pub async fn handle(&self, request: Request) -> Response {
        match self.try_handle(request).await {
            Ok(response) => response,
            Err(err) => {
                log::error!("request failed in `{}`: {}", self.app.name(), err);
                err.into_response()
            }
        }
    }

    /// Blocking variant of [`Adapter::handle`] for hosts that invoke the function synchronously.
    pub fn handle_blocking(&self, request: Request) -> Response {
        executor::block_on(self.handle(request))
    }

    async fn try_handle(&self, request: Request) -> Result<Response, BridgeError> {
        let environ = Environ::from_request(request).await?;
        let mut collector = ResponseCollector::new();
        let dispatch = self.dispatch(HostRequest::gateway(environ, &mut collector))?;
        match dispatch {
            Dispatch::Invoked(output) => collector.into_response(output),
            Dispatch::Passthrough(_) => Err(BridgeError::internal(anyhow::anyhow!(
                "gateway request was not invoked"
            ))),
        }
    }
}
