//! Symbol table
//!
//! Symbols are keyed by name alone. Two symbols with the same name in
//! different scopes collide: the first one added is kept and later ones are
//! dropped with a warning.

use cmigrate_core::{Declaration, FunctionDef, StructDef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Kind of named entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Variable,
    Function,
    Type,
    Struct,
}

/// Scope a symbol was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolScope {
    Global,
    Function,
    Block,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Type => write!(f, "type"),
            SymbolKind::Struct => write!(f, "struct"),
        }
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "variable" | "var" => Ok(SymbolKind::Variable),
            "function" | "fn" => Ok(SymbolKind::Function),
            "type" | "typedef" => Ok(SymbolKind::Type),
            "struct" => Ok(SymbolKind::Struct),
            _ => Err(format!("unknown symbol kind: {}", s)),
        }
    }
}

impl fmt::Display for SymbolScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolScope::Global => write!(f, "global"),
            SymbolScope::Function => write!(f, "function"),
            SymbolScope::Block => write!(f, "block"),
        }
    }
}

impl FromStr for SymbolScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" => Ok(SymbolScope::Global),
            "function" => Ok(SymbolScope::Function),
            "block" => Ok(SymbolScope::Block),
            _ => Err(format!("unknown symbol scope: {}", s)),
        }
    }
}

/// A named program entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Human-readable type, e.g. `pointer to char`
    pub type_info: String,
    pub scope: SymbolScope,
    /// Files that reference this symbol
    pub referencing_files: BTreeSet<String>,
}

impl Symbol {
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        type_info: impl Into<String>,
        scope: SymbolScope,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            type_info: type_info.into(),
            scope,
            referencing_files: BTreeSet::new(),
        }
    }

    /// Record a file where this symbol is referenced
    pub fn add_reference(&mut self, file: impl Into<String>) {
        self.referencing_files.insert(file.into());
    }
}

/// Table of symbols keyed by name
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol. Returns false, and leaves the table unchanged, if a
    /// symbol with the same name already exists.
    pub fn add_symbol(&mut self, symbol: Symbol) -> bool {
        if self.by_name.contains_key(&symbol.name) {
            warn!("Symbol {} already exists in table", symbol.name);
            return false;
        }
        self.by_name.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
        true
    }

    /// Add a function definition (global scope, typed by its return type)
    pub fn add_function(&mut self, func: &FunctionDef) -> bool {
        self.add_symbol(Symbol::new(
            func.name.clone(),
            SymbolKind::Function,
            func.return_type.clone(),
            SymbolScope::Global,
        ))
    }

    /// Add a variable declaration; typedefs become `Type` symbols
    pub fn add_variable(&mut self, decl: &Declaration, scope: SymbolScope) -> bool {
        let kind = if decl.is_typedef {
            SymbolKind::Type
        } else {
            SymbolKind::Variable
        };
        self.add_symbol(Symbol::new(decl.name.clone(), kind, decl.type_name.clone(), scope))
    }

    /// Add a named struct definition
    pub fn add_struct(&mut self, st: &StructDef) -> bool {
        if st.name.is_empty() {
            return false;
        }
        let type_info = format!("struct with fields: {}", st.field_names().join(", "));
        self.add_symbol(Symbol::new(
            st.name.clone(),
            SymbolKind::Struct,
            type_info,
            SymbolScope::Global,
        ))
    }

    pub fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).map(|&i| &self.symbols[i])
    }

    /// Record that `file` references the symbol `name`. Returns false if
    /// no such symbol exists.
    pub fn add_reference(&mut self, name: &str, file: impl Into<String>) -> bool {
        match self.by_name.get(name) {
            Some(&i) => {
                self.symbols[i].add_reference(file);
                true
            }
            None => false,
        }
    }

    /// All symbols in insertion order
    pub fn get_all_symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn get_symbols_by_kind(&self, kind: SymbolKind) -> Vec<&Symbol> {
        self.symbols.iter().filter(|s| s.kind == kind).collect()
    }

    pub fn get_symbols_by_scope(&self, scope: SymbolScope) -> Vec<&Symbol> {
        self.symbols.iter().filter(|s| s.scope == scope).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmigrate_core::StructField;

    fn field(name: &str, type_name: &str) -> StructField {
        StructField {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }

    #[test]
    fn test_first_insertion_wins() {
        let mut table = SymbolTable::new();
        assert!(table.add_symbol(Symbol::new("count", SymbolKind::Variable, "int", SymbolScope::Global)));
        assert!(!table.add_symbol(Symbol::new("count", SymbolKind::Function, "void", SymbolScope::Block)));

        let symbol = table.get_symbol("count").unwrap();
        assert_eq!(symbol.kind, SymbolKind::Variable);
        assert_eq!(symbol.scope, SymbolScope::Global);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_queries_by_kind_and_scope() {
        let mut table = SymbolTable::new();
        table.add_symbol(Symbol::new("main", SymbolKind::Function, "int", SymbolScope::Global));
        table.add_symbol(Symbol::new("i", SymbolKind::Variable, "int", SymbolScope::Block));
        table.add_symbol(Symbol::new("total", SymbolKind::Variable, "long", SymbolScope::Global));

        let vars: Vec<_> = table
            .get_symbols_by_kind(SymbolKind::Variable)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(vars, vec!["i", "total"]);

        let globals: Vec<_> = table
            .get_symbols_by_scope(SymbolScope::Global)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(globals, vec!["main", "total"]);
        assert!(table.get_symbols_by_kind(SymbolKind::Struct).is_empty());
        assert_eq!(table.get_all_symbols().len(), 3);
    }

    #[test]
    fn test_helpers_from_definitions() {
        let mut table = SymbolTable::new();
        table.add_function(&FunctionDef {
            name: "parse".into(),
            return_type: "pointer to char".into(),
            params: vec![],
        });
        table.add_struct(&StructDef {
            name: "point".into(),
            fields: vec![field("x", "int"), field("y", "int")],
        });
        table.add_variable(
            &Declaration {
                name: "size_type".into(),
                type_name: "unsigned long".into(),
                is_typedef: true,
                is_prototype: false,
                is_extern: false,
            },
            SymbolScope::Global,
        );

        assert_eq!(table.get_symbol("parse").unwrap().type_info, "pointer to char");
        assert_eq!(
            table.get_symbol("point").unwrap().type_info,
            "struct with fields: x, y"
        );
        assert_eq!(table.get_symbol("size_type").unwrap().kind, SymbolKind::Type);
    }

    #[test]
    fn test_references_accumulate() {
        let mut table = SymbolTable::new();
        table.add_symbol(Symbol::new("log", SymbolKind::Function, "void", SymbolScope::Global));

        assert!(table.add_reference("log", "/p/a.c"));
        assert!(table.add_reference("log", "/p/b.c"));
        assert!(table.add_reference("log", "/p/a.c"));
        assert!(!table.add_reference("missing", "/p/a.c"));

        assert_eq!(table.get_symbol("log").unwrap().referencing_files.len(), 2);
    }

    #[test]
    fn test_entries_stay_keyed_by_name() {
        let mut table = SymbolTable::new();
        table.add_symbol(Symbol::new("log", SymbolKind::Function, "void", SymbolScope::Global));
        table.add_reference("log", "/p/a.c");

        assert!(table.add_symbol(Symbol::new("other", SymbolKind::Variable, "int", SymbolScope::Global)));
        assert_eq!(table.get_symbol("log").unwrap().name, "log");
        assert_eq!(table.get_symbol("other").unwrap().name, "other");
        let named_other = table
            .get_all_symbols()
            .iter()
            .filter(|s| s.name == "other")
            .count();
        assert_eq!(named_other, 1);
    }

    #[test]
    fn test_kind_round_trip_through_text() {
        for kind in [SymbolKind::Variable, SymbolKind::Function, SymbolKind::Type, SymbolKind::Struct] {
            assert_eq!(kind.to_string().parse::<SymbolKind>().unwrap(), kind);
        }
        assert!("union".parse::<SymbolKind>().is_err());
        assert_eq!("BLOCK".parse::<SymbolScope>().unwrap(), SymbolScope::Block);
    }
}
