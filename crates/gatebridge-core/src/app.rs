use std::fmt;
use std::sync::Arc;

use crate::environ::Environ;
use crate::error::BridgeError;
use crate::gateway::{AppOutput, GatewayApp, StartResponse};

const DEFAULT_APP_NAME: &str = "Gatebridge App";

/// Shared handle to an already constructed gateway application.
///
/// Cloning is cheap and every clone refers to the same application; [`App::ptr_eq`] tells whether
/// two handles wrap the very same instance.
#[derive(Clone)]
pub struct App {
    inner: Arc<dyn GatewayApp>,
    name: String,
}

impl App {
    /// Wrap an application under the default name.
    pub fn new<A>(app: A) -> Self
    where
        A: GatewayApp + 'static,
    {
        Self::with_name(app, DEFAULT_APP_NAME)
    }

    /// Construct a new application handle with the provided name.
    pub fn with_name<A, S>(app: A, name: S) -> Self
    where
        A: GatewayApp + 'static,
        S: Into<String>,
    {
        Self::from_arc(Arc::new(app), name)
    }

    pub fn from_arc<S>(inner: Arc<dyn GatewayApp>, name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            inner,
            name: name.into(),
        }
    }

    /// Invoke the application under the gateway convention.
    pub fn call(
        &self,
        environ: &Environ,
        start_response: &mut dyn StartResponse,
    ) -> Result<AppOutput, BridgeError> {
        self.inner.call(environ, start_response)
    }

    /// Name assigned to the application.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Update the application name.
    pub fn set_name<S>(&mut self, name: S)
    where
        S: Into<String>,
    {
        self.name = name.into();
    }

    pub fn gateway(&self) -> &Arc<dyn GatewayApp> {
        &self.inner
    }

    pub fn ptr_eq(&self, other: &App) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Default name used when none is provided.
    pub fn default_name() -> &'static str {
        DEFAULT_APP_NAME
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App").field("name", &self.name).finish()
    }
}

/// Trait implemented by application crates to describe how their gateway app is built.
pub trait Hooks {
    /// Allow implementations to mutate the freshly constructed application before use.
    /// The default implementation performs no changes.
    fn configure(_app: &mut App) {}

    /// Build the gateway application.
    fn gateway() -> Arc<dyn GatewayApp>;

    /// Display name for the application. Defaults to `"Gatebridge App"`.
    fn name() -> &'static str {
        App::default_name()
    }

    /// Construct an `App` by building the gateway and invoking the configuration hook.
    fn build_app() -> App
    where
        Self: Sized,
    {
        let mut app = App::from_arc(Self::gateway(), Self::name());
        Self::configure(&mut app);
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ResponseCollector;
    use crate::http::StatusCode;

    fn ok_app(
        environ: &Environ,
        start_response: &mut dyn StartResponse,
    ) -> Result<AppOutput, BridgeError> {
        start_response.start("200 OK", Vec::new())?;
        Ok(AppOutput::from(
            environ.method().unwrap_or("NONE").to_string(),
        ))
    }

    #[test]
    fn default_app_uses_constant_name() {
        let app = App::new(ok_app);
        assert_eq!(app.name(), App::default_name());
    }

    #[test]
    fn call_forwards_to_wrapped_application() {
        let app = App::new(ok_app);
        let environ = Environ::from_vars([("REQUEST_METHOD", "PUT")]);
        let mut collector = ResponseCollector::new();
        let output = app.call(&environ, &mut collector).expect("output");
        assert_eq!(output.concat().as_ref(), b"PUT");
        assert_eq!(collector.status(), Some(StatusCode::OK));
    }

    #[test]
    fn clones_share_the_same_instance() {
        let app = App::new(ok_app);
        let clone = app.clone();
        assert!(app.ptr_eq(&clone));
        assert!(!app.ptr_eq(&App::new(ok_app)));
    }

    struct TestHooks;

    impl Hooks for TestHooks {
        fn gateway() -> Arc<dyn GatewayApp> {
            Arc::new(ok_app)
        }

        fn configure(app: &mut App) {
            app.set_name("configured");
        }

        fn name() -> &'static str {
            "hooks-name"
        }
    }

    #[test]
    fn build_app_invokes_hooks_for_gateway_and_configuration() {
        let app = TestHooks::build_app();
        assert_eq!(app.name(), "configured");

        let mut collector = ResponseCollector::new();
        let output = app
            .call(&Environ::from_vars([("REQUEST_METHOD", "GET")]), &mut collector)
            .expect("output");
        assert_eq!(output.concat().as_ref(), b"GET");
    }

    struct DefaultHooks;

    impl Hooks for DefaultHooks {
        fn gateway() -> Arc<dyn GatewayApp> {
            Arc::new(ok_app)
        }
    }

    #[test]
    fn default_hooks_use_default_name() {
        let app = DefaultHooks::build_app();
        assert_eq!(app.name(), App::default_name());
        assert_eq!(format!("{:?}", app), "App { name: \"Gatebridge App\" }");
    }
}
