// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{AssetClass, HashStorageMode, Mode};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// dev_root = "build"
/// release_root = "dist"
///
/// [server]
/// port = 3000
///
/// [asset.markup]
/// source = ["src/html/*.html"]
/// watch = ["src/html/**/*.html"]
/// dev_dest = "build"
/// release_dest = "dist"
/// clean = "*.html"
/// transform = "include"
/// ```
///
/// All sections are optional. Leaving out `[asset]` entirely selects the
/// built-in layout returned by [`default_assets`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub release: ReleaseSection,

    /// `[asset.<class>]` sections keyed by kebab-case class name.
    #[serde(default)]
    pub asset: Option<BTreeMap<String, AssetConfig>>,
}

/// Validated, immutable configuration shared by every component.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    project_dir: PathBuf,
    paths: PathsSection,
    server: ServerSection,
    watch: WatchSection,
    release: ReleaseSection,
    assets: BTreeMap<AssetClass, AssetSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        paths: PathsSection,
        server: ServerSection,
        watch: WatchSection,
        release: ReleaseSection,
        assets: BTreeMap<AssetClass, AssetSpec>,
    ) -> Self {
        Self {
            project_dir: PathBuf::from("."),
            paths,
            server,
            watch,
            release,
            assets,
        }
    }

    /// Anchor every relative path of this config at `dir`.
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Resolve a project-relative path against the project directory.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.project_dir.join(rel)
    }

    pub fn paths(&self) -> &PathsSection {
        &self.paths
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn release(&self) -> &ReleaseSection {
        &self.release
    }

    pub fn assets(&self) -> &BTreeMap<AssetClass, AssetSpec> {
        &self.assets
    }

    pub fn asset(&self, class: AssetClass) -> Option<&AssetSpec> {
        self.assets.get(&class)
    }

    /// Output root for the given mode (relative to the project directory).
    pub fn output_root(&self, mode: Mode) -> &Path {
        match mode {
            Mode::Dev => &self.paths.dev_root,
            Mode::Release => &self.paths.release_root,
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_dev_root")]
    pub dev_root: PathBuf,

    #[serde(default = "default_release_root")]
    pub release_root: PathBuf,
}

fn default_dev_root() -> PathBuf {
    PathBuf::from("build")
}

fn default_release_root() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            dev_root: default_dev_root(),
            release_root: default_release_root(),
        }
    }
}

/// `[server]` section for the dev server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    /// `0` lets the OS pick a free port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Default for `use_hash` on classes that do not set it.
    #[serde(default)]
    pub use_hash: bool,

    #[serde(default)]
    pub hash_storage: HashStorageMode,
}

/// `[release]` section controlling style purging.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseSection {
    /// Regexes for selector names that are never purged.
    #[serde(default = "default_safelist")]
    pub purge_safelist: Vec<String>,

    /// Globs, relative to the release root, whose contents decide which
    /// selectors are in use.
    #[serde(default = "default_purge_content")]
    pub purge_content: Vec<String>,
}

fn default_safelist() -> Vec<String> {
    vec!["^veno".to_string(), "^swiper-pagination".to_string()]
}

fn default_purge_content() -> Vec<String> {
    vec!["**/*.html".to_string(), "**/*.js".to_string()]
}

impl Default for ReleaseSection {
    fn default() -> Self {
        Self {
            purge_safelist: default_safelist(),
            purge_content: default_purge_content(),
        }
    }
}

/// Which collaborator transforms a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Include,
    Concat,
    Sass,
    Script,
    Image,
    Copy,
    Command,
}

impl TransformKind {
    /// Transform used when `[asset.<class>]` does not name one.
    pub fn default_for(class: AssetClass) -> Self {
        match class {
            AssetClass::Markup => TransformKind::Include,
            AssetClass::StylesPrecompiled | AssetClass::ScriptsVendor => TransformKind::Concat,
            AssetClass::StylesSource => TransformKind::Sass,
            AssetClass::Scripts => TransformKind::Script,
            AssetClass::Images => TransformKind::Image,
            AssetClass::ServerScripts => TransformKind::Copy,
        }
    }
}

/// `[asset.<class>]` section as written by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    /// Transform inputs: globs or literal paths, in order.
    pub source: Vec<String>,

    /// Extra patterns that trigger a rebuild without being inputs.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Patterns removed from the transform inputs.
    #[serde(default)]
    pub exclude: Vec<String>,

    pub dev_dest: String,

    pub release_dest: String,

    /// Glob relative to the destination selecting what a rebuild deletes.
    #[serde(default = "default_clean")]
    pub clean: String,

    #[serde(default)]
    pub transform: Option<TransformKind>,

    /// Output file name for `concat`.
    #[serde(default)]
    pub output: Option<String>,

    /// Shell command for `command`; reads stdin, writes stdout.
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub use_hash: Option<bool>,
}

fn default_clean() -> String {
    "**/*".to_string()
}

/// Resolved transform selection with its required parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformSpec {
    Include,
    Concat { output: String },
    Sass,
    Script,
    Image,
    Copy,
    Command { command: String },
}

impl TransformSpec {
    pub fn name(&self) -> &'static str {
        match self {
            TransformSpec::Include => "include",
            TransformSpec::Concat { .. } => "concat",
            TransformSpec::Sass => "sass",
            TransformSpec::Script => "script",
            TransformSpec::Image => "image",
            TransformSpec::Copy => "copy",
            TransformSpec::Command { .. } => "command",
        }
    }
}

/// Validated per-class path specification.
#[derive(Debug, Clone)]
pub struct AssetSpec {
    pub class: AssetClass,
    pub source: Vec<String>,
    pub watch: Vec<String>,
    pub exclude: Vec<String>,
    pub dev_dest: PathBuf,
    pub release_dest: PathBuf,
    pub clean: String,
    pub transform: TransformSpec,
    pub use_hash: Option<bool>,
}

impl AssetSpec {
    pub fn destination(&self, mode: Mode) -> &Path {
        match mode {
            Mode::Dev => &self.dev_dest,
            Mode::Release => &self.release_dest,
        }
    }

    /// Patterns whose changes should rebuild this class (`source ∪ watch`).
    pub fn watch_patterns(&self) -> impl Iterator<Item = &str> {
        self.source.iter().chain(self.watch.iter()).map(String::as_str)
    }

    pub fn effective_use_hash(&self, default_use_hash: bool) -> bool {
        self.use_hash.unwrap_or(default_use_hash)
    }
}

/// The layout of the project this tool grew out of: sources under `src/`,
/// development output in `build/`, release output in `dist/`.
pub fn default_assets() -> BTreeMap<String, AssetConfig> {
    let asset = |source: &[&str], dev: &str, release: &str| AssetConfig {
        source: source.iter().map(|s| s.to_string()).collect(),
        watch: Vec::new(),
        exclude: Vec::new(),
        dev_dest: dev.to_string(),
        release_dest: release.to_string(),
        clean: default_clean(),
        transform: None,
        output: None,
        command: None,
        use_hash: None,
    };

    let mut assets = BTreeMap::new();

    let mut markup = asset(&["src/html/*.html"], "build", "dist");
    markup.watch = vec!["src/html/**/*.html".to_string()];
    markup.clean = "*.html".to_string();
    assets.insert(AssetClass::Markup.to_string(), markup);

    let mut css = asset(&["src/css/**/*.css"], "build/assets/css", "dist/assets/css");
    css.output = Some("plugins.css".to_string());
    assets.insert(AssetClass::StylesPrecompiled.to_string(), css);

    let mut scss = asset(&["src/scss/**/*.scss"], "build/assets/css", "dist/assets/css");
    scss.exclude = vec!["src/scss/plugins/**/*.scss".to_string()];
    assets.insert(AssetClass::StylesSource.to_string(), scss);

    assets.insert(
        AssetClass::Scripts.to_string(),
        asset(&["src/js/*.js"], "build/assets/js", "dist/assets/js"),
    );

    let mut vendor = asset(
        &[
            "src/js/plugins/bootstrap.bundle.min.js",
            "src/js/plugins/swiper-bundle.min.js",
            "src/js/plugins/aos.min.js",
            "src/js/plugins/venobox.min.js",
            "src/js/plugins/typed.umd.js",
            "src/js/plugins/headroom.min.js",
        ],
        "build/assets/js",
        "dist/assets/js",
    );
    vendor.watch = vec!["src/js/plugins/**/*.js".to_string()];
    vendor.output = Some("plugins.js".to_string());
    assets.insert(AssetClass::ScriptsVendor.to_string(), vendor);

    assets.insert(
        AssetClass::Images.to_string(),
        asset(
            &["src/images/**/*.{jpg,jpeg,png,svg}"],
            "build/assets/images",
            "dist/assets/images",
        ),
    );

    assets.insert(
        AssetClass::ServerScripts.to_string(),
        asset(&["src/php/**/*.php"], "build/assets/php", "dist/assets/php"),
    );

    assets
}
