//! Core type definitions
//!
//! Structural definitions produced by the parser and consumed by the index.

use serde::{Deserialize, Serialize};

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Return type
    pub return_type: String,
    /// Parameters
    pub params: Vec<Parameter>,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (empty for unnamed parameters)
    pub name: String,
    /// Parameter type
    pub type_name: String,
}

/// Struct definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    /// Struct name
    pub name: String,
    /// Fields
    pub fields: Vec<StructField>,
}

impl StructDef {
    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Struct field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    /// Field name
    pub name: String,
    /// Field type
    pub type_name: String,
}

/// Top-level declaration (global variable, prototype or typedef)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declared name
    pub name: String,
    /// Type description, e.g. `pointer to char`
    pub type_name: String,
    /// Declared with `typedef`
    pub is_typedef: bool,
    /// Declares a function prototype rather than an object
    pub is_prototype: bool,
    /// Declared with `extern` storage
    pub is_extern: bool,
}

impl Declaration {
    /// Whether this declaration defines its name in the current file
    pub fn is_definition(&self) -> bool {
        !self.is_prototype && !self.is_extern
    }
}
