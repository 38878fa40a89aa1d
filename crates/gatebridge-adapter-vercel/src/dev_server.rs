use std::convert::Infallible;
use std::net::{SocketAddr, TcpListener as StdTcpListener};

use anyhow::Context;
use axum::body::Body as AxumBody;
use axum::http::{Request as AxumRequest, Response as AxumResponse, StatusCode};
use axum::Router;
use futures::executor::block_on;
use tokio::runtime::{Builder as RuntimeBuilder, Handle};
use tokio::{signal, task};
use tower::service_fn;
use tracing::error;

use gatebridge_core::body::Body;
use gatebridge_core::http::{Request as CoreRequest, Response as CoreResponse};

use crate::handler::Adapter;

/// Configuration for serving an adapter locally, outside the serverless host.
#[derive(Clone, Debug)]
pub struct DevServerConfig {
    pub addr: SocketAddr,
    pub enable_ctrl_c: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            enable_ctrl_c: true,
        }
    }
}

/// Blocking dev server that plays the host's role for a single adapter.
pub struct DevServer {
    adapter: Adapter,
    config: DevServerConfig,
}

impl DevServer {
    pub fn new(adapter: Adapter) -> Self {
        Self {
            adapter,
            config: DevServerConfig::default(),
        }
    }

    pub fn with_config(adapter: Adapter, config: DevServerConfig) -> Self {
        Self { adapter, config }
    }

    pub fn run(self) -> anyhow::Result<()> {
        let runtime = RuntimeBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;

        runtime.block_on(async move { self.run_async().await })
    }

    async fn run_async(self) -> anyhow::Result<()> {
        let DevServer { adapter, config } = self;

        let listener = StdTcpListener::bind(config.addr)
            .with_context(|| format!("failed to bind dev server to {}", config.addr))?;
        listener
            .set_nonblocking(true)
            .context("failed to set listener to non-blocking")?;

        let listener = tokio::net::TcpListener::from_std(listener)
            .context("failed to adopt std listener into tokio")?;

        log::info!(
            "serving `{}` on http://{}",
            adapter.app().name(),
            config.addr
        );
        serve_with_listener(adapter, listener, config.enable_ctrl_c).await
    }
}

/// Axum router sending every request through the adapter.
pub fn build_router(adapter: Adapter) -> Router {
    Router::new().fallback_service(service_fn(move |request: AxumRequest<AxumBody>| {
        let adapter = adapter.clone();
        async move {
            // Core bodies are not `Send`; run the whole exchange on this worker thread.
            let response = task::block_in_place(move || {
                let core_request = into_core_request(request);
                let core_response = Handle::current().block_on(adapter.handle(core_request));
                into_axum_response(core_response)
            });
            Ok::<_, Infallible>(response)
        }
    }))
}

async fn serve_with_listener(
    adapter: Adapter,
    listener: tokio::net::TcpListener,
    enable_ctrl_c: bool,
) -> anyhow::Result<()> {
    let make_service = build_router(adapter).into_make_service();

    let server = axum::serve(listener, make_service);
    if enable_ctrl_c {
        server
            .with_graceful_shutdown(async {
                let _ = signal::ctrl_c().await;
            })
            .await
            .context("axum server error")?;
    } else {
        server.await.context("axum server error")?;
    }

    Ok(())
}

/// Convert an Axum/Hyper request into a core request, keeping the body streaming.
pub fn into_core_request(request: AxumRequest<AxumBody>) -> CoreRequest {
    let (parts, body) = request.into_parts();
    CoreRequest::from_parts(parts, Body::from_stream(body.into_data_stream()))
}

/// Convert a core response into one consumable by Axum/Hyper. Streaming bodies are buffered.
pub fn into_axum_response(response: CoreResponse) -> AxumResponse<AxumBody> {
    let (parts, body) = response.into_parts();
    let body = match body {
        Body::Once(bytes) => AxumBody::from(bytes),
        stream @ Body::Stream(_) => match block_on(stream.collect()) {
            Ok(bytes) => AxumBody::from(bytes),
            Err(err) => {
                error!("streaming response error: {err}");
                let mut response = AxumResponse::new(AxumBody::from("streaming response error"));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response.headers_mut().insert(
                    axum::http::header::CONTENT_TYPE,
                    axum::http::HeaderValue::from_static("text/plain; charset=utf-8"),
                );
                return response;
            }
        },
    };

    AxumResponse::from_parts(parts, body)
}
