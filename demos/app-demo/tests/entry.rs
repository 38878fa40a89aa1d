use std::path::Path;

use gatebridge_adapter_vercel::{Adapter, AdapterConfig, HostRequest};
use gatebridge_core::gateway::ResponseCollector;
use gatebridge_core::http::StatusCode;
use serde_json::json;

fn adapter() -> Adapter {
    app_demo::register();
    let location = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("api")
        .join("index.rs");
    Adapter::initialize(AdapterConfig::new(location)).expect("demo adapter")
}

#[test]
fn entry_point_resolves_the_demo_module() {
    let adapter = adapter();
    assert_eq!(adapter.module(), Some("app"));
    assert_eq!(adapter.app().name(), "Gatebridge Demo");
    assert_eq!(
        adapter.search_path().entries()[0],
        Path::new(env!("CARGO_MANIFEST_DIR"))
    );
}

#[test]
fn entry_point_serves_gateway_events() {
    let adapter = adapter();
    let mut collector = ResponseCollector::new();
    let event = json!({ "environ": { "REQUEST_METHOD": "GET", "PATH_INFO": "/echo/vercel" } });

    let output = adapter
        .dispatch(HostRequest::from_event(event, &mut collector))
        .expect("dispatch")
        .into_output()
        .expect("invoked");
    assert_eq!(collector.status(), Some(StatusCode::OK));
    assert_eq!(output.concat().as_ref(), b"Hello, vercel!");
}
