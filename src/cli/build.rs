//! Site building orchestration.
//!
//! One build pass:
//! - **Load** - parse every template and layout, collect posts and tags
//! - **Hooks** - pick output hooks for the build mode
//! - **Write** - clear the target and mirror the source tree into it

use std::time::Instant;

use anyhow::{Result, anyhow};

use crate::{
    config::SiteConfig,
    core::{BuildError, BuildMode},
    debug, log,
    pipeline::{self, BuildStats, Hooks},
    site::Site,
};

/// Load the site and write it to the configured target directory.
pub fn build_site(config: &SiteConfig, mode: BuildMode) -> Result<BuildStats> {
    let site = Site::load(config, mode).map_err(with_stage)?;
    debug!(
        "build";
        "{} posts, {} pages, {} tags",
        site.posts().count(),
        site.pages().count(),
        site.tag_names().count()
    );
    let hooks = Hooks::for_build(config.build.minify, mode);
    pipeline::build(&site, &config.build.target, &hooks).map_err(with_stage)
}

/// `kiln build`: one production pass, reported on the terminal.
pub fn run_build(config: &SiteConfig) -> Result<()> {
    let started = Instant::now();
    let stats = build_site(config, config.build_mode())?;

    log!(
        "build";
        "{} rendered, {} copied in {}ms",
        plural_count(stats.rendered, "page"),
        plural_count(stats.copied, "file"),
        started.elapsed().as_millis()
    );
    if stats.drafts > 0 {
        log!("build"; "{} skipped", plural_count(stats.drafts, "draft"));
    }
    Ok(())
}

fn with_stage(err: BuildError) -> anyhow::Error {
    anyhow!("{} failed: {}", err.stage(), err.detail())
}

fn plural_count(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::config::test_config_at;

    #[test]
    fn test_build_site_writes_target() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/index.md"),
            "---\ntitle: Hi\n---\n# {{ page.title }}\n",
        )
        .unwrap();
        fs::write(dir.path().join("src/robots.txt"), "User-agent: *\n").unwrap();

        let config = test_config_at(dir.path(), "");
        let stats = build_site(&config, BuildMode::PRODUCTION).unwrap();

        assert_eq!(stats.rendered, 1);
        assert_eq!(stats.copied, 1);
        let html = fs::read_to_string(dir.path().join("target/index.html")).unwrap();
        assert!(html.contains("<h1>Hi</h1>"));
    }

    #[test]
    fn test_build_error_names_stage() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/index.html"),
            "---\nlayout: base\n---\nbody\n",
        )
        .unwrap();

        let config = test_config_at(dir.path(), "");
        let err = build_site(&config, BuildMode::PRODUCTION).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("render failed"));
        assert!(message.contains("base"));
    }

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(1, "page"), "1 page");
        assert_eq!(plural_count(3, "draft"), "3 drafts");
    }
}
