//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;

/// cmigrate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project root path
    pub project_root: PathBuf,

    /// Preprocessor configuration
    pub preprocessor: PreprocessorConfig,

    /// Parser configuration
    pub parser: ParserConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            preprocessor: PreprocessorConfig::default(),
            parser: ParserConfig::default(),
        }
    }
}

impl Config {
    /// Create a configuration rooted at `project_root`
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }
}

/// Preprocessor configuration
///
/// No macros or include directories are assumed; the caller supplies both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    /// Macro definitions, applied in this order
    pub macros: Vec<MacroDefinition>,

    /// Include search directories, searched in this order
    pub include_paths: Vec<PathBuf>,
}

/// Parser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// File extensions to parse
    pub extensions: Vec<String>,

    /// Directory glob patterns to exclude
    pub exclude_dirs: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["c".into(), "h".into()],
            exclude_dirs: vec![".git".into(), "build".into(), "target".into()],
        }
    }
}

/// An object-like macro definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    pub value: String,
}

impl MacroDefinition {
    /// Create a macro that is simply defined (value `1`)
    pub fn defined(name: &str) -> Self {
        Self::with_value(name, "1")
    }

    /// Create a macro with a specific value
    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl std::str::FromStr for MacroDefinition {
    type Err = Error;

    /// Parse a `-D` style definition: `NAME` or `NAME=VALUE`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), value),
            None => (s.trim(), "1"),
        };

        let valid = name
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false)
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid {
            return Err(Error::Config(format!("invalid macro name: {:?}", name)));
        }

        Ok(Self::with_value(name, value))
    }
}
