//! `[site]` section configuration.
//!
//! The whole section is exposed to templates as `config` (and `site`).
//!
//! ```toml
//! [site]
//! title = "My Blog"
//! author = "Alice"
//! url = "https://myblog.com"
//! lang = "en"
//!
//! [site.extra]
//! github = "https://github.com/alice"
//! ```

use serde::{Deserialize, Serialize};

/// Site metadata available to every template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSectionConfig {
    /// Site title.
    pub title: String,

    /// Author name.
    pub author: String,

    /// Site description.
    pub description: String,

    /// Absolute site URL. Set to the local address while serving when empty.
    pub url: Option<String>,

    /// Language code (e.g., "en", "es").
    pub lang: String,

    /// Custom fields, accessible as `config.extra.xxx`.
    pub extra: toml::Table,
}

impl Default for SiteSectionConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            description: String::new(),
            url: None,
            lang: "en".into(),
            extra: toml::Table::new(),
        }
    }
}

impl SiteSectionConfig {
    /// Collect validation errors.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if let Some(url) = &self.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            errors.push(format!(
                "site.url `{url}` must start with http:// or https://"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_site_config() {
        let config = test_parse_config(
            "[site]\ntitle = \"Blog\"\nauthor = \"Alice\"\nurl = \"https://a.dev\"\n[site.extra]\ngithub = \"alice\"",
        );
        assert_eq!(config.site.title, "Blog");
        assert_eq!(config.site.author, "Alice");
        assert_eq!(config.site.url.as_deref(), Some("https://a.dev"));
        assert_eq!(config.site.lang, "en");
        assert_eq!(
            config.site.extra.get("github").and_then(|v| v.as_str()),
            Some("alice")
        );
    }

    #[test]
    fn test_site_url_validation() {
        let mut errors = Vec::new();
        test_parse_config("[site]\nurl = \"ftp://a.dev\"")
            .site
            .validate(&mut errors);
        assert_eq!(errors.len(), 1);

        let mut errors = Vec::new();
        test_parse_config("[site]\nurl = \"http://localhost:4001\"")
            .site
            .validate(&mut errors);
        assert!(errors.is_empty());
    }
}
