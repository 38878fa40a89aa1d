use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use gatebridge_core::http::{Request, Response};
use tower_service::Service;

use crate::handler::Adapter;

pub type ResponseFuture = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + 'static>>;

/// Tower service that feeds HTTP requests through an [`Adapter`].
#[derive(Clone)]
pub struct GatebridgeService {
    adapter: Adapter,
}

impl GatebridgeService {
    pub fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }
}

impl Service<Request> for GatebridgeService {
    type Response = Response;
    type Error = Infallible;
    type Future = ResponseFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let adapter = self.adapter.clone();
        Box::pin(async move { Ok(adapter.handle(request).await) })
    }
}
