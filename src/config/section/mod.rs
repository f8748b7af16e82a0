//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kiln.toml`:
//!
//! | Module  | TOML Section | Purpose                                   |
//! |---------|--------------|-------------------------------------------|
//! | `build` | `[build]`    | Source/target dirs, highlighting, minify  |
//! | `serve` | `[serve]`    | Development server and live reload        |
//! | `site`  | `[site]`     | Site metadata exposed to templates        |

mod build;
mod serve;
mod site;

pub use build::BuildSectionConfig;
pub use serve::ServeConfig;
pub use site::SiteSectionConfig;
