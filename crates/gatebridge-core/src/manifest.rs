use log::LevelFilter;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

/// Module descriptor file extension; module `app` is described by `app.toml`.
pub const MODULE_MANIFEST_EXTENSION: &str = "toml";

#[derive(Clone)]
pub struct ManifestLoader {
    manifest: Arc<Manifest>,
}

impl ManifestLoader {
    pub fn load_from_str(contents: &str) -> Result<Self, io::Error> {
        let mut manifest = parse(contents)?;
        manifest.finalize();
        Ok(Self {
            manifest: Arc::new(manifest),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, io::Error> {
        let contents = std::fs::read_to_string(path)?;
        let mut manifest = parse(&contents)?;
        let cwd = std::env::current_dir()?;
        manifest.root = Some(resolve_root_path(path, &cwd));
        manifest.finalize();
        Ok(Self {
            manifest: Arc::new(manifest),
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self {
            manifest: Arc::new(Manifest::default()),
        }
    }
}

fn parse(contents: &str) -> Result<Manifest, io::Error> {
    let manifest: Manifest = toml::from_str(contents)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    manifest
        .validate()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    Ok(manifest)
}

fn resolve_root_path(path: &Path, cwd: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => cwd.to_path_buf(),
        Some(parent) if parent.is_relative() => cwd.join(parent),
        Some(parent) => parent.to_path_buf(),
        None => cwd.to_path_buf(),
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct Manifest {
    #[serde(default)]
    #[validate(nested)]
    pub app: ManifestApp,
    #[serde(default)]
    #[validate(nested)]
    pub logging: ManifestLogging,
    #[serde(skip)]
    pub(crate) root: Option<PathBuf>,
    #[serde(skip)]
    pub(crate) logging_resolved: BTreeMap<String, ResolvedLoggingConfig>,
}

impl Manifest {
    /// Directory the manifest was loaded from, when it came from disk.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app.name.as_deref()
    }

    pub fn logging_for(&self, adapter: &str) -> Option<&ResolvedLoggingConfig> {
        self.logging_resolved.get(&adapter.to_ascii_lowercase())
    }

    pub fn logging_or_default(&self, adapter: &str) -> ResolvedLoggingConfig {
        self.logging_for(adapter).cloned().unwrap_or_default()
    }

    fn finalize(&mut self) {
        self.logging_resolved = self
            .logging
            .adapters
            .iter()
            .map(|(adapter, cfg)| {
                (
                    adapter.to_ascii_lowercase(),
                    ResolvedLoggingConfig::from_manifest(cfg),
                )
            })
            .collect();
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ManifestApp {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ManifestLogging {
    #[serde(flatten)]
    #[validate(nested)]
    pub adapters: BTreeMap<String, ManifestLoggingConfig>,
}

#[derive(Debug, Default, Deserialize, Clone, Validate)]
pub struct ManifestLoggingConfig {
    #[serde(default)]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub echo_stdout: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLoggingConfig {
    pub level: LogLevel,
    pub echo_stdout: Option<bool>,
}

impl Default for ResolvedLoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            echo_stdout: None,
        }
    }
}

impl ResolvedLoggingConfig {
    fn from_manifest(cfg: &ManifestLoggingConfig) -> Self {
        let mut resolved = Self::default();
        if let Some(level) = cfg.level {
            resolved.level = level;
        }
        if let Some(echo_stdout) = cfg.echo_stdout {
            resolved.echo_stdout = Some(echo_stdout);
        }
        resolved
    }

    /// Effective filter: `echo_stdout = false` silences logging entirely.
    pub fn level_filter(&self) -> LevelFilter {
        if self.echo_stdout.unwrap_or(true) {
            self.level.into()
        } else {
            LevelFilter::Off
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "off" => Ok(Self::Off),
            other => Err(serde::de::Error::custom(format!(
                "logging level must be trace, debug, info, warn, error, or off (got `{}`)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[app]
name = "demo"
description = "Demo storefront"

[logging.vercel]
level = "debug"

[logging.axum]
level = "warn"
echo_stdout = false
"#;

    #[test]
    fn parse_manifest_sample() {
        let loader = ManifestLoader::load_from_str(SAMPLE).expect("manifest");
        let manifest = loader.manifest();
        assert_eq!(manifest.app_name(), Some("demo"));
        assert_eq!(manifest.app.description.as_deref(), Some("Demo storefront"));
        assert!(manifest.root().is_none());
    }

    #[test]
    fn adapter_logging_is_resolved_case_insensitively() {
        let loader = ManifestLoader::load_from_str(SAMPLE).expect("manifest");
        let vercel = loader.manifest().logging_or_default("Vercel");
        assert_eq!(vercel.level, LogLevel::Debug);
        assert_eq!(vercel.level_filter(), LevelFilter::Debug);

        let axum = loader.manifest().logging_or_default("axum");
        assert_eq!(axum.level, LogLevel::Warn);
        assert_eq!(axum.level_filter(), LevelFilter::Off);
    }

    #[test]
    fn logging_or_default_returns_default_when_missing() {
        let loader = ManifestLoader::load_from_str("").expect("manifest");
        let logging = loader.manifest().logging_or_default("vercel");
        assert_eq!(logging, ResolvedLoggingConfig::default());
        assert_eq!(logging.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn empty_name_fails_validation() {
        let err = ManifestLoader::load_from_str("[app]\nname = \"\"\n")
            .err()
            .expect("validation error");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let err = ManifestLoader::load_from_str("[logging.vercel]\nlevel = \"loud\"\n")
            .err()
            .expect("invalid level");
        assert!(err.to_string().contains("logging level must be"));
    }

    #[test]
    fn from_path_sets_root_for_absolute_parent() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("app.toml");
        fs::write(&path, SAMPLE).expect("write manifest");

        let loader = ManifestLoader::from_path(&path).expect("manifest");
        assert_eq!(loader.manifest().root(), Some(dir.path()));
    }

    #[test]
    fn from_path_reports_missing_file() {
        let dir = tempdir().expect("temp dir");
        let err = ManifestLoader::from_path(&dir.path().join("missing.toml"))
            .err()
            .expect("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn from_path_reports_invalid_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("app.toml");
        fs::write(&path, "[app\nname = ").expect("write manifest");
        let err = ManifestLoader::from_path(&path).err().expect("invalid toml");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn resolve_root_path_variants() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_root_path(Path::new("app.toml"), cwd), PathBuf::from("/work"));
        assert_eq!(
            resolve_root_path(Path::new("site/app.toml"), cwd),
            PathBuf::from("/work/site")
        );
        assert_eq!(
            resolve_root_path(Path::new("/srv/site/app.toml"), cwd),
            PathBuf::from("/srv/site")
        );
        assert_eq!(resolve_root_path(Path::new("/"), cwd), PathBuf::from("/work"));
    }

    #[test]
    fn log_level_round_trips_names() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Off,
        ] {
            let toml = format!("[logging.vercel]\nlevel = \"{}\"\n", level.as_str().to_uppercase());
            let loader = ManifestLoader::load_from_str(&toml).expect("manifest");
            assert_eq!(loader.manifest().logging_or_default("vercel").level, level);
        }
    }
}
