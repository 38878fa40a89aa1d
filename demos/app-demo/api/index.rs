use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("app-demo failed: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    app_demo::register();
    let location = Path::new(env!("CARGO_MANIFEST_DIR")).join("api").join("index.rs");
    gatebridge_adapter_vercel::run_app(location)
}
