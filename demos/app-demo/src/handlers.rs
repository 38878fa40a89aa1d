use bytes::Bytes;
use gatebridge_core::environ::Environ;
use gatebridge_core::error::BridgeError;
use gatebridge_core::gateway::{AppOutput, HeaderList, StartResponse};

const TEXT: &str = "text/plain; charset=utf-8";

fn text_headers() -> HeaderList {
    vec![("Content-Type".into(), TEXT.into())]
}

pub(crate) fn root(
    _environ: &Environ,
    start_response: &mut dyn StartResponse,
) -> Result<AppOutput, BridgeError> {
    start_response.start("200 OK", text_headers())?;
    Ok(AppOutput::from("Gatebridge Demo App"))
}

pub(crate) fn echo(
    environ: &Environ,
    start_response: &mut dyn StartResponse,
) -> Result<AppOutput, BridgeError> {
    let name = environ
        .path_info()
        .and_then(|path| path.strip_prefix("/echo/"))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BridgeError::bad_request("expected /echo/{name}"))?;
    start_response.start("200 OK", text_headers())?;
    Ok(AppOutput::from(format!("Hello, {name}!")))
}

pub(crate) fn headers(
    environ: &Environ,
    start_response: &mut dyn StartResponse,
) -> Result<AppOutput, BridgeError> {
    let ua = environ.header("User-Agent").unwrap_or("(unknown)");
    start_response.start("200 OK", text_headers())?;
    Ok(AppOutput::from(format!("ua={ua}")))
}

pub(crate) fn stream(
    _environ: &Environ,
    start_response: &mut dyn StartResponse,
) -> Result<AppOutput, BridgeError> {
    start_response.start("200 OK", text_headers())?;
    Ok(AppOutput::from_chunks(
        (0..5).map(|index| Bytes::from(format!("chunk {index}\n"))),
    ))
}

pub(crate) fn environ(
    environ: &Environ,
    start_response: &mut dyn StartResponse,
) -> Result<AppOutput, BridgeError> {
    let body = serde_json::to_vec(environ.vars()).map_err(BridgeError::internal)?;
    start_response.start(
        "200 OK",
        vec![("Content-Type".into(), "application/json".into())],
    )?;
    Ok(AppOutput::from(body))
}

pub(crate) fn not_found(
    environ: &Environ,
    start_response: &mut dyn StartResponse,
) -> Result<AppOutput, BridgeError> {
    start_response.start("404 Not Found", text_headers())?;
    Ok(AppOutput::from(format!(
        "no route for {}",
        environ.path_info().unwrap_or("/")
    )))
}
