//! cmigrate Core
//!
//! Shared types, configuration and errors for the cmigrate workspace.

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use config::{Config, MacroDefinition, ParserConfig, PreprocessorConfig};
pub use error::{Error, Result};
pub use paths::canonicalize;
pub use types::*;
