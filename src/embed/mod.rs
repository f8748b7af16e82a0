//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server scripts (livereload.js)
//!
//! ```ignore
//! use embed::serve::{LIVERELOAD_JS, LiveReloadVars};
//!
//! let js = LIVERELOAD_JS.render(&LiveReloadVars { events_path: "/_events/" });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL prefix of the server-sent events endpoint.
    pub const EVENTS_PATH: &str = "/_events/";

    /// Variables for livereload.js.
    pub struct LiveReloadVars<'a> {
        pub events_path: &'a str,
    }

    impl TemplateVars for LiveReloadVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replace("__KILN_EVENTS_PATH__", self.events_path)
        }
    }

    /// Live reload client, minified at build time.
    pub const LIVERELOAD_JS: Template<LiveReloadVars<'static>> =
        Template::new(include_str!(concat!(env!("OUT_DIR"), "/livereload.min.js")));

    /// Render the `<script>` tag injected into served HTML.
    pub fn livereload_script() -> String {
        let js = LIVERELOAD_JS.render(&LiveReloadVars {
            events_path: EVENTS_PATH,
        });
        format!("<script>{js}</script>")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_script_targets_events_endpoint() {
            let script = livereload_script();
            assert!(script.starts_with("<script>"));
            assert!(script.ends_with("</script>"));
            assert!(script.contains(EVENTS_PATH));
            assert!(!script.contains("__KILN_EVENTS_PATH__"));
        }
    }
}
