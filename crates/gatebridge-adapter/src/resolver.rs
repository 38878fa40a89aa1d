use std::path::{Path, PathBuf};

use gatebridge_core::app::App;
use gatebridge_core::error::BridgeError;
use gatebridge_core::manifest::{ManifestLoader, MODULE_MANIFEST_EXTENSION};

use crate::registry;
use crate::search_path::SearchPath;

/// A module located on the search path together with the application it exports.
pub struct ResolvedModule {
    name: String,
    location: PathBuf,
    manifest: ManifestLoader,
    app: App,
}

impl ResolvedModule {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the module descriptor that satisfied the lookup.
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn manifest(&self) -> &ManifestLoader {
        &self.manifest
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn into_app(self) -> App {
        self.app
    }
}

pub struct ModuleResolver<'a> {
    search_path: &'a SearchPath,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(search_path: &'a SearchPath) -> Self {
        Self { search_path }
    }

    /// Locate `module` on the search path and build the application registered under its name.
    pub fn resolve(&self, module: &str) -> Result<ResolvedModule, BridgeError> {
        validate_module_name(module)?;

        let file_name = format!("{module}.{MODULE_MANIFEST_EXTENSION}");
        let location = self.search_path.find_file(&file_name).ok_or_else(|| {
            BridgeError::module_not_found(module, self.search_path.entries().to_vec())
        })?;

        let manifest = ManifestLoader::from_path(&location).map_err(|err| {
            BridgeError::module_load(module, format!("{}: {err}", location.display()))
        })?;

        let registration = registry::get_module(module).ok_or_else(|| {
            let available = registry::registered_modules();
            let message = if available.is_empty() {
                "no application is registered under this name (no modules registered)".to_string()
            } else {
                format!(
                    "no application is registered under this name (registered: {})",
                    available.join(", ")
                )
            };
            BridgeError::module_load(module, message)
        })?;

        let mut app = registration.build()?;
        if let Some(name) = manifest.manifest().app_name() {
            app.set_name(name);
        }

        log::info!(
            "resolved module `{}` from {} as app `{}`",
            module,
            location.display(),
            app.name()
        );

        Ok(ResolvedModule {
            name: module.to_string(),
            location,
            manifest,
            app,
        })
    }
}

fn validate_module_name(module: &str) -> Result<(), BridgeError> {
    let valid = !module.is_empty()
        && module
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(())
    } else {
        Err(BridgeError::module_load(
            module,
            "module names may only contain ASCII letters, digits, `_` and `-`",
        ))
    }
}
