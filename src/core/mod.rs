//! Core types shared across the codebase.

mod driver;
mod error;
mod state;

pub use driver::BuildMode;
pub use error::{BuildError, BuildResult};
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
