//! Sample gateway application exported as module `app`.

mod app;
mod handlers;

use ctor::ctor;
use gatebridge_adapter::{register_module, ModuleRegistration};

pub use app::{DemoApp, DemoRoutes};

static APP_MODULE: ModuleRegistration = ModuleRegistration::new("app", app::build);

pub fn register() {
    register_module(&APP_MODULE);
}

#[ctor]
fn register_ctor() {
    register();
}
