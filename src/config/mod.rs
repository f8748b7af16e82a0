//! Site configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── serve      # [serve]
//! │   └── site       # [site]
//! ├── error          # ConfigError
//! ├── util           # Config file discovery
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section   | Purpose                                          |
//! |-----------|--------------------------------------------------|
//! | `[site]`  | Site metadata exposed to templates as `config`   |
//! | `[build]` | Source/target/layouts/includes/data, minify      |
//! | `[serve]` | Development server (port, interface, watch)      |

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{BuildSectionConfig, ServeConfig, SiteSectionConfig};

use crate::{
    cli::{BuildArgs, Cli, Commands},
    core::BuildMode,
    log,
    utils::path::normalize_path,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Whether the dev server is running (internal use only)
    #[serde(skip)]
    pub serving: bool,

    /// Site metadata
    #[serde(default)]
    pub site: SiteSectionConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildSectionConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file. The project root is
    /// the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_from(&cwd, cli)
    }

    /// Load configuration, searching for the config file from `start`.
    pub fn load_from(start: &Path, cli: &Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(start, &cli.config) else {
            bail!(
                "config file '{}' not found in {} or any parent directory",
                cli.config.display(),
                start.display()
            );
        };

        let mut config = Self::from_path(&config_path)?;
        config.config_path = config_path;
        config.finalize(cli);
        config.validate()?;

        Ok(config)
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self::update_option(&mut self.build.src, cli.src.as_ref());
        Self::update_option(&mut self.build.target, cli.target.as_ref());
        self.normalize_paths(&root);
        self.apply_command_options(cli);
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "ignoring unknown fields in {}: {}", display_path, fields.join(", "));
    }

    /// Build mode for the current command.
    ///
    /// Serving always renders drafts; live reload follows `[serve]`.
    pub const fn build_mode(&self) -> BuildMode {
        if self.serving {
            BuildMode::DEVELOPMENT.with_live_reload(self.serve.live_reload_enabled())
        } else {
            BuildMode::PRODUCTION.with_drafts(self.build.drafts)
        }
    }

    /// Local address the dev server listens on.
    pub fn serve_url(&self) -> String {
        format!("http://{}:{}", self.serve.interface, self.serve.port)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Build { build_args } => {
                self.apply_build_args(build_args);
            }
            Commands::Serve {
                build_args,
                interface,
                port,
                watch,
                no_reload,
            } => {
                self.serving = true;
                // Served output stays readable unless `--minify` asks otherwise
                self.build.minify = false;
                self.apply_build_args(build_args);
                self.apply_serve_options(*interface, *port, *watch, *no_reload);
            }
        }
    }

    /// Apply build arguments from CLI.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        crate::logger::set_verbose(args.verbose);

        Self::update_option(&mut self.build.minify, args.minify.as_ref());
        self.build.drafts |= args.drafts;
    }

    /// Apply serve-specific options.
    fn apply_serve_options(
        &mut self,
        interface: Option<std::net::IpAddr>,
        port: Option<u16>,
        watch: Option<bool>,
        no_reload: bool,
    ) {
        Self::update_option(&mut self.serve.interface, interface.as_ref());
        Self::update_option(&mut self.serve.port, port.as_ref());
        Self::update_option(&mut self.serve.watch, watch.as_ref());
        if no_reload {
            self.serve.live_reload = false;
        }

        if self.site.url.is_none() {
            self.site.url = Some(self.serve_url());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all paths relative to root directory.
    fn normalize_paths(&mut self, root: &Path) {
        let root = normalize_path(root);
        self.config_path = normalize_path(&self.config_path);

        let build = &mut self.build;
        for dir in [
            &mut build.src,
            &mut build.target,
            &mut build.layouts,
            &mut build.includes,
            &mut build.data,
        ] {
            *dir = normalize_path(&root.join(&*dir));
        }

        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration. Collects all errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !self.build.src.is_dir() {
            errors.push(format!(
                "source directory '{}' does not exist",
                self.build.src.display()
            ));
        }

        self.site.validate(&mut errors);
        self.build.validate(&self.root, &mut errors);
        self.serve.validate(&mut errors);

        ConfigError::from_messages(errors)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Config rooted at `root` with default directories, as if loaded from disk.
#[cfg(test)]
pub fn test_config_at(root: &Path, content: &str) -> SiteConfig {
    let mut config = test_parse_config(content);
    config.config_path = root.join("kiln.toml");
    config.normalize_paths(root);
    config
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn project(config: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("kiln.toml"), config).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        dir
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kiln").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::parse_with_ignored("[base\ntitle = \"My Blog\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[site]\ntitle = \"Test\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.site.title, "Test");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let (_, ignored) = SiteConfig::parse_with_ignored("[site]\ntitle = \"Test\"").unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_load_build() {
        let dir = project("[site]\ntitle = \"Blog\"\n[build]\ndrafts = true");
        let nested = dir.path().join("src");
        let config = SiteConfig::load_from(&nested, &cli(&["build"])).unwrap();

        let root = normalize_path(dir.path());
        assert_eq!(config.root, root);
        assert_eq!(config.build.src, root.join("src"));
        assert_eq!(config.build.target, root.join("target"));
        assert_eq!(config.build.layouts, root.join("layouts"));
        assert!(!config.serving);
        assert_eq!(config.site.url, None);

        let mode = config.build_mode();
        assert!(mode.include_drafts);
        assert!(!mode.live_reload);
    }

    #[test]
    fn test_load_cli_overrides() {
        let dir = project("");
        fs::create_dir_all(dir.path().join("content")).unwrap();
        let config = SiteConfig::load_from(
            dir.path(),
            &cli(&["-s", "content", "-t", "public", "build", "--minify"]),
        )
        .unwrap();

        let root = normalize_path(dir.path());
        assert_eq!(config.build.src, root.join("content"));
        assert_eq!(config.build.target, root.join("public"));
        assert!(config.build.minify);
    }

    #[test]
    fn test_load_serve() {
        let dir = project("[serve]\nport = 5000");
        let config =
            SiteConfig::load_from(dir.path(), &cli(&["serve", "--no-reload"])).unwrap();

        assert!(config.serving);
        assert_eq!(config.site.url.as_deref(), Some("http://127.0.0.1:5000"));

        let mode = config.build_mode();
        assert!(mode.include_drafts);
        assert!(!mode.live_reload);
    }

    #[test]
    fn test_serve_ignores_configured_minify() {
        let dir = project("[build]\nminify = true");

        let served = SiteConfig::load_from(dir.path(), &cli(&["serve"])).unwrap();
        assert!(!served.build.minify);

        let forced = SiteConfig::load_from(dir.path(), &cli(&["serve", "--minify"])).unwrap();
        assert!(forced.build.minify);

        let built = SiteConfig::load_from(dir.path(), &cli(&["build"])).unwrap();
        assert!(built.build.minify);
    }

    #[test]
    fn test_load_serve_keeps_configured_url() {
        let dir = project("[site]\nurl = \"https://blog.dev\"");
        let config = SiteConfig::load_from(dir.path(), &cli(&["serve"])).unwrap();
        assert_eq!(config.site.url.as_deref(), Some("https://blog.dev"));
        assert!(config.build_mode().live_reload);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let result = SiteConfig::load_from(dir.path(), &cli(&["-C", "nope.toml", "build"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_src() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("kiln.toml"), "").unwrap();
        let err = SiteConfig::load_from(dir.path(), &cli(&["build"])).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
