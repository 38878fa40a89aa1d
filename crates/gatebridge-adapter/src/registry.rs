use gatebridge_core::app::App;
use gatebridge_core::error::BridgeError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

/// Builds the application exported by a module.
pub type AppFactory = fn() -> Result<App, BridgeError>;

/// Static description of an importable application module.
pub struct ModuleRegistration {
    name: &'static str,
    factory: AppFactory,
}

impl ModuleRegistration {
    pub const fn new(name: &'static str, factory: AppFactory) -> Self {
        Self { name, factory }
    }

    /// Name used to reference the module (case-insensitive).
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn build(&self) -> Result<App, BridgeError> {
        (self.factory)()
    }
}

static REGISTRY: Lazy<RwLock<HashMap<String, &'static ModuleRegistration>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a module so adapters can resolve it by name.
pub fn register_module(registration: &'static ModuleRegistration) {
    let mut registry = REGISTRY
        .write()
        .expect("gatebridge module registry lock poisoned");
    registry.insert(registration.name().to_ascii_lowercase(), registration);
}

/// Looks up a module by name.
pub fn get_module(name: &str) -> Option<&'static ModuleRegistration> {
    let registry = REGISTRY
        .read()
        .expect("gatebridge module registry lock poisoned");
    registry.get(&name.to_ascii_lowercase()).copied()
}

/// Returns the names of all registered modules.
pub fn registered_modules() -> Vec<String> {
    let registry = REGISTRY
        .read()
        .expect("gatebridge module registry lock poisoned");
    let mut names: Vec<String> = registry.keys().cloned().collect();
    names.sort();
    names
}
