//! Serverless function entry point for Gatebridge gateway applications.
//!
//! The host loads the function file, which calls [`Adapter::initialize`] once with its own
//! location. The directory above the function's directory is placed at the front of the module
//! search path, the configured module (default `app`) is resolved, and every later invocation is
//! forwarded through [`Adapter::dispatch`].

mod handler;
mod logging;
mod request;
mod service;

#[cfg(feature = "dev-server")]
mod dev_server;

/// Key used for this adapter's section in module manifests (`[logging.vercel]`).
pub const ADAPTER_NAME: &str = "vercel";

pub use handler::{Adapter, AdapterConfig, Dispatch, DEFAULT_MODULE};
pub use logging::{init_from_manifest, init_logger};
pub use request::{GatewayRequest, HostRequest};
pub use service::{GatebridgeService, ResponseFuture};

#[cfg(feature = "dev-server")]
pub use dev_server::{
    build_router, into_axum_response, into_core_request, DevServer, DevServerConfig,
};

/// Initialise the adapter for the function at `location`, configure logging from the resolved
/// module's manifest, and serve it locally until interrupted.
#[cfg(feature = "dev-server")]
pub fn run_app<P>(location: P) -> anyhow::Result<()>
where
    P: AsRef<std::path::Path>,
{
    use anyhow::Context;

    let location = location.as_ref();
    let adapter = Adapter::initialize(AdapterConfig::new(location))
        .with_context(|| format!("failed to initialise adapter at {}", location.display()))?;

    let level = init_from_manifest(adapter.manifest().manifest());
    log::info!(
        "module `{}` ready as `{}` (log level {})",
        adapter.module().unwrap_or(DEFAULT_MODULE),
        adapter.app().name(),
        level
    );

    DevServer::new(adapter).run()
}
