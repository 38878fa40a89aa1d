//! Locating and loading the application module an adapter wraps.
//!
//! Application crates register a factory under a module name; an adapter resolves that name
//! against an ordered [`SearchPath`], where a module is present when `<name>.toml` exists in one
//! of the directories.

mod registry;
mod resolver;
mod search_path;

pub use registry::{
    get_module, register_module, registered_modules, AppFactory, ModuleRegistration,
};
pub use resolver::{ModuleResolver, ResolvedModule};
pub use search_path::SearchPath;
