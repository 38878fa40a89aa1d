use std::sync::OnceLock;

use gatebridge_core::manifest::Manifest;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use crate::ADAPTER_NAME;

static LOGGER_INSTALLED: OnceLock<LevelFilter> = OnceLock::new();

/// Install the process logger at `level`. Later calls keep the first logger and return the level
/// it was installed with.
pub fn init_logger(level: LevelFilter) -> LevelFilter {
    *LOGGER_INSTALLED.get_or_init(|| {
        SimpleLogger::new().with_level(level).init().ok();
        level
    })
}

/// Install the logger using the `[logging.vercel]` section of a module manifest.
pub fn init_from_manifest(manifest: &Manifest) -> LevelFilter {
    let logging = manifest.logging_or_default(ADAPTER_NAME);
    init_logger(logging.level_filter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatebridge_core::manifest::ManifestLoader;

    #[test]
    fn first_initialisation_wins() {
        let loader = ManifestLoader::load_from_str("[logging.vercel]\nlevel = \"warn\"\n")
            .expect("manifest");
        let installed = init_from_manifest(loader.manifest());
        assert_eq!(init_logger(LevelFilter::Trace), installed);
    }
}
