//! Configuration system for Skylift
//!
//! Values come from command line flags, a `skylift.toml`/`skylift.yaml` file,
//! and the environment (process variables over an env file), in that order
//! of precedence.

pub mod defaults;
mod env;
mod loader;
mod resolve;
mod types;

pub use defaults::*;
pub use env::*;
pub use loader::*;
pub use resolve::*;
pub use types::*;
