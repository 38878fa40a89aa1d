//! Core primitives shared by Gatebridge adapters: the synchronous gateway calling convention,
//! HTTP aliases, bodies, errors and module manifests.

pub mod app;
pub mod body;
pub mod environ;
pub mod error;
pub mod gateway;
pub mod http;
pub mod manifest;
pub mod response;
