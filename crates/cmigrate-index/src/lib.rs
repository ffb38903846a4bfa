//! cmigrate Index
//!
//! Cross-file bookkeeping for a C project:
//!
//! - `symbol_table` - named entities with kind, scope and type metadata
//! - `graph` - directed file graph with interned node handles
//! - `dependency` - file dependencies fed by explicit edges or symbol events

pub mod dependency;
pub mod graph;
pub mod symbol_table;

pub use dependency::{DependencyMapper, FileEntry};
pub use graph::{FileGraph, NodeId, TopoOrder};
pub use symbol_table::{Symbol, SymbolKind, SymbolScope, SymbolTable};
