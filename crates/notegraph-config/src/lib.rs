//! # Notegraph Configuration Library
//!
//! Typed configuration for the notegraph workspace: where the object store
//! lives, how cold loads are parallelised, search paging, and logging.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notegraph_config::{init_logging, NotegraphConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = NotegraphConfig::load_from_file("notegraph.toml").await?;
//!     config.apply_env_overrides()?;
//!     init_logging(&config.logging);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod loader;
pub mod logging;

pub use config::*;
pub use error::{ConfigError, ConfigResult};
pub use loader::{ENV_LOG_LEVEL, ENV_PAGE_SIZE, ENV_ROOT};
pub use logging::init_logging;
