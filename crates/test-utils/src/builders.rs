use std::collections::BTreeMap;
use std::path::PathBuf;

use assetpipe::config::{
    default_assets, AssetConfig, ConfigFile, PathsSection, RawConfigFile, TransformKind,
};
use assetpipe::errors::PipelineError;
use assetpipe::types::{AssetClass, HashStorageMode};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts with no asset classes; use [`ConfigFileBuilder::default_layout`]
/// for the built-in project layout.
pub struct ConfigFileBuilder {
    raw: RawConfigFile,
    assets: BTreeMap<String, AssetConfig>,
    project_dir: Option<PathBuf>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfigFile::default(),
            assets: BTreeMap::new(),
            project_dir: None,
        }
    }

    /// The built-in `src/` -> `build/` + `dist/` layout.
    pub fn default_layout() -> Self {
        let mut builder = Self::new();
        builder.assets = default_assets();
        builder
    }

    pub fn with_asset(mut self, class: AssetClass, asset: AssetConfig) -> Self {
        self.assets.insert(class.to_string(), asset);
        self
    }

    pub fn without_asset(mut self, class: AssetClass) -> Self {
        self.assets.remove(class.as_str());
        self
    }

    pub fn with_roots(mut self, dev_root: &str, release_root: &str) -> Self {
        self.raw.paths = PathsSection {
            dev_root: PathBuf::from(dev_root),
            release_root: PathBuf::from(release_root),
        };
        self
    }

    pub fn with_default_use_hash(mut self, val: bool) -> Self {
        self.raw.watch.use_hash = val;
        self
    }

    pub fn with_hash_storage(mut self, mode: HashStorageMode) -> Self {
        self.raw.watch.hash_storage = mode;
        self
    }

    pub fn with_safelist(mut self, patterns: &[&str]) -> Self {
        self.raw.release.purge_safelist = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_server_port(mut self, port: u16) -> Self {
        self.raw.server.port = port;
        self
    }

    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    pub fn try_build(self) -> Result<ConfigFile, PipelineError> {
        let mut raw = self.raw;
        raw.asset = Some(self.assets);
        let cfg = ConfigFile::try_from(raw)?;
        Ok(match self.project_dir {
            Some(dir) => cfg.with_project_dir(dir),
            None => cfg,
        })
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `AssetConfig`.
pub struct AssetConfigBuilder {
    asset: AssetConfig,
}

impl AssetConfigBuilder {
    pub fn new(source: &[&str], dev_dest: &str, release_dest: &str) -> Self {
        Self {
            asset: AssetConfig {
                source: source.iter().map(|s| s.to_string()).collect(),
                watch: vec![],
                exclude: vec![],
                dev_dest: dev_dest.to_string(),
                release_dest: release_dest.to_string(),
                clean: "**/*".to_string(),
                transform: None,
                output: None,
                command: None,
                use_hash: None,
            },
        }
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.asset.watch.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.asset.exclude.push(pattern.to_string());
        self
    }

    pub fn clean(mut self, pattern: &str) -> Self {
        self.asset.clean = pattern.to_string();
        self
    }

    pub fn transform(mut self, kind: TransformKind) -> Self {
        self.asset.transform = Some(kind);
        self
    }

    pub fn output(mut self, name: &str) -> Self {
        self.asset.output = Some(name.to_string());
        self
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.asset.command = Some(cmd.to_string());
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.asset.use_hash = Some(val);
        self
    }

    pub fn build(self) -> AssetConfig {
        self.asset
    }
}
