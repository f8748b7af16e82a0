//! Build mode configuration for production/development builds.

/// Build mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Render and publish templates marked `draft: true`.
    pub include_drafts: bool,

    /// Inject the live reload client into HTML output.
    pub live_reload: bool,
}

impl BuildMode {
    /// Production mode: drafts are skipped, no dev-server scripts.
    pub const PRODUCTION: Self = Self {
        include_drafts: false,
        live_reload: false,
    };

    /// Development mode: drafts included, live reload client injected.
    pub const DEVELOPMENT: Self = Self {
        include_drafts: true,
        live_reload: true,
    };

    /// Same mode with live reload switched on or off.
    #[inline]
    pub const fn with_live_reload(self, live_reload: bool) -> Self {
        Self {
            live_reload,
            ..self
        }
    }

    /// Same mode with drafts forced on (`--drafts` / `build.drafts`).
    #[inline]
    pub const fn with_drafts(self, include_drafts: bool) -> Self {
        Self {
            include_drafts: self.include_drafts || include_drafts,
            ..self
        }
    }
}
