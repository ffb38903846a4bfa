//! cmigrate Parser
//!
//! Source normalization and structural parsing for C projects.
//!
//! ## Modules
//!
//! - `preprocessor` - simplified include/macro/conditional preprocessing
//! - `treesitter` - structural extraction using tree-sitter

pub mod preprocessor;
pub mod treesitter;

use cmigrate_core::{Declaration, FunctionDef, Result, StructDef};
use std::collections::BTreeSet;
use std::path::Path;

pub use preprocessor::Preprocessor;
pub use treesitter::TreeSitterParser;

/// Parse result containing extracted information
#[derive(Debug, Default, Clone)]
pub struct ParseResult {
    /// Function definitions, in source order
    pub functions: Vec<FunctionDef>,
    /// Named struct definitions (with a body), in source order
    pub structs: Vec<StructDef>,
    /// Top-level declarations and typedefs, in source order
    pub declarations: Vec<Declaration>,
    /// Identifiers and type names used in the file. Names only being
    /// declared (variables, parameters, prototypes, typedefs) are excluded.
    pub references: BTreeSet<String>,
    /// Parse errors (non-fatal)
    pub errors: Vec<String>,
}

impl ParseResult {
    /// Look up a function definition by name
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Look up a struct definition by name
    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Look up a top-level declaration by name
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Names this file defines: functions, structs, typedefs and
    /// non-extern global variables. Prototypes and `extern` declarations
    /// only announce a symbol and are not counted.
    pub fn defined_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        names.extend(self.functions.iter().map(|f| f.name.as_str()));
        names.extend(self.structs.iter().map(|s| s.name.as_str()));
        names.extend(
            self.declarations
                .iter()
                .filter(|d| d.is_definition())
                .map(|d| d.name.as_str()),
        );
        names
    }
}

/// Parser trait for different backends
pub trait Parser: Send + Sync {
    /// Parse source code string
    fn parse(&self, source: &str, filename: &str) -> Result<ParseResult>;

    /// Parse a file
    fn parse_file(&self, path: &Path) -> Result<ParseResult> {
        let source = std::fs::read_to_string(path)?;
        let filename = path.to_string_lossy();
        self.parse(&source, &filename)
    }

    /// Get parser name
    fn name(&self) -> &str;
}

/// Get the default parser
pub fn get_parser() -> Box<dyn Parser> {
    Box::new(treesitter::TreeSitterParser::new())
}
