//! Tree-sitter based parser for C language
//!
//! Extracts function definitions, struct definitions, top-level declarations
//! and the set of referenced names from preprocessed source.

use cmigrate_core::{Declaration, FunctionDef, Parameter, Result, StructDef, StructField};
use tracing::debug;
use tree_sitter::{Language, Node, Parser as TSParser, Tree};

use crate::ParseResult;

/// Tree-sitter based parser
pub struct TreeSitterParser {
    language: Language,
}

impl TreeSitterParser {
    /// Create a new Tree-sitter parser for C
    pub fn new() -> Self {
        Self {
            language: tree_sitter_c::language(),
        }
    }

    fn syntax_tree(&self, source: &str) -> Result<Tree> {
        let mut parser = TSParser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| cmigrate_core::Error::Parse(format!("Failed to load C grammar: {}", e)))?;
        parser
            .parse(source, None)
            .ok_or_else(|| cmigrate_core::Error::Parse("Failed to parse source".into()))
    }

    /// Parse source code and extract information
    pub fn parse_source(&self, source: &str, filename: &str) -> Result<ParseResult> {
        let tree = self.syntax_tree(source)?;
        let mut result = ParseResult::default();
        self.extract_definitions(&tree, source, filename, &mut result);
        Ok(result)
    }

    fn extract_definitions(
        &self,
        tree: &Tree,
        source: &str,
        filename: &str,
        result: &mut ParseResult,
    ) {
        let root = tree.root_node();

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if matches!(child.kind(), "declaration" | "type_definition") {
                let decls = self.extract_declarations(child, source);
                for decl in &decls {
                    debug!("Found declaration: {} ({})", decl.name, decl.type_name);
                }
                result.declarations.extend(decls);
            }
        }

        self.visit_node(root, source, filename, result);

        if root.has_error() && result.errors.is_empty() {
            result.errors.push(format!("{}: syntax error", filename));
        }
    }

    fn visit_node(&self, node: Node, source: &str, filename: &str, result: &mut ParseResult) {
        match node.kind() {
            "function_definition" => {
                if let Some(func) = self.extract_function(node, source) {
                    debug!("Found function: {}", func.name);
                    result.functions.push(func);
                }
            }
            "struct_specifier" => {
                if let Some(st) = self.extract_struct(node, source) {
                    debug!("Found struct: {}", st.name);
                    result.structs.push(st);
                }
            }
            "identifier" | "type_identifier" if !is_declared_name(node) => {
                result.references.insert(self.node_text(node, source));
            }
            _ => {}
        }

        if node.is_error() || node.is_missing() {
            result.errors.push(format!(
                "{}:{}: syntax error",
                filename,
                node.start_position().row + 1
            ));
        }

        // Recursively visit children
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit_node(child, source, filename, result);
        }
    }

    fn extract_function(&self, node: Node, source: &str) -> Option<FunctionDef> {
        let base = self.base_type(node, source);
        let declarator = node.child_by_field_name("declarator")?;
        let (name, description) = self.describe_declarator(declarator, base, source);

        if name.is_empty() {
            return None;
        }

        let return_type = description
            .strip_prefix("function returning ")
            .unwrap_or(&description)
            .to_string();

        Some(FunctionDef {
            name,
            return_type,
            params: self.extract_parameters(declarator, source),
        })
    }

    /// Type text of a node's `type` field, e.g. `unsigned int`, `struct foo`
    fn base_type(&self, node: Node, source: &str) -> String {
        node.child_by_field_name("type")
            .map(|t| self.node_text(t, source))
            .unwrap_or_default()
    }

    /// Read a C declarator inside-out: `T *D` gives D the type
    /// `pointer to T`, `T D[n]` gives `array of T`, `T D(...)` gives
    /// `function returning T`.
    fn describe_declarator(&self, node: Node, base: String, source: &str) -> (String, String) {
        match node.kind() {
            "identifier" | "type_identifier" | "field_identifier" => {
                (self.node_text(node, source), base)
            }
            "pointer_declarator" => match node.child_by_field_name("declarator") {
                Some(inner) => self.describe_declarator(inner, format!("pointer to {}", base), source),
                None => (String::new(), format!("pointer to {}", base)),
            },
            "array_declarator" => match node.child_by_field_name("declarator") {
                Some(inner) => self.describe_declarator(inner, format!("array of {}", base), source),
                None => (String::new(), format!("array of {}", base)),
            },
            "function_declarator" => match node.child_by_field_name("declarator") {
                Some(inner) => {
                    self.describe_declarator(inner, format!("function returning {}", base), source)
                }
                None => (String::new(), format!("function returning {}", base)),
            },
            "init_declarator" | "parenthesized_declarator" => {
                let inner = node
                    .child_by_field_name("declarator")
                    .or_else(|| node.named_child(0));
                match inner {
                    Some(inner) => self.describe_declarator(inner, base, source),
                    None => (String::new(), base),
                }
            }
            _ => (String::new(), base),
        }
    }

    /// Innermost function declarator below `node`, skipping pointers
    fn find_function_declarator<'a>(&self, node: Node<'a>) -> Option<Node<'a>> {
        match node.kind() {
            "function_declarator" => Some(node),
            "pointer_declarator" | "init_declarator" | "parenthesized_declarator" => node
                .child_by_field_name("declarator")
                .or_else(|| node.named_child(0))
                .and_then(|inner| self.find_function_declarator(inner)),
            _ => None,
        }
    }

    fn extract_parameters(&self, declarator: Node, source: &str) -> Vec<Parameter> {
        let Some(func) = self.find_function_declarator(declarator) else {
            return Vec::new();
        };
        let Some(list) = func.child_by_field_name("parameters") else {
            return Vec::new();
        };

        let mut params = Vec::new();
        let mut cursor = list.walk();
        for param_node in list.children(&mut cursor) {
            if param_node.kind() == "parameter_declaration" {
                if let Some(param) = self.extract_parameter(param_node, source) {
                    params.push(param);
                }
            }
        }
        params
    }

    fn extract_parameter(&self, node: Node, source: &str) -> Option<Parameter> {
        let base = self.base_type(node, source);
        let (name, type_name) = match node.child_by_field_name("declarator") {
            Some(declarator) => self.describe_declarator(declarator, base, source),
            None => (String::new(), base),
        };

        // `f(void)` declares no parameters
        if name.is_empty() && (type_name.is_empty() || type_name == "void") {
            return None;
        }

        Some(Parameter { name, type_name })
    }

    fn extract_declarations(&self, node: Node, source: &str) -> Vec<Declaration> {
        let is_typedef = node.kind() == "type_definition";
        let base = self.base_type(node, source);

        let mut is_extern = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "storage_class_specifier" && self.node_text(child, source) == "extern" {
                is_extern = true;
            }
        }

        let mut decls = Vec::new();
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let (name, type_name) = self.describe_declarator(declarator, base.clone(), source);
            if name.is_empty() {
                continue;
            }
            decls.push(Declaration {
                is_prototype: !is_typedef && type_name.starts_with("function returning"),
                name,
                type_name,
                is_typedef,
                is_extern,
            });
        }
        decls
    }

    fn get_struct_name(&self, node: Node, source: &str) -> String {
        node.child_by_field_name("name")
            .map(|n| self.node_text(n, source))
            .unwrap_or_default()
    }

    /// Only specifiers with a body define a struct; `struct foo *p` merely
    /// mentions one.
    fn extract_struct(&self, node: Node, source: &str) -> Option<StructDef> {
        let name = self.get_struct_name(node, source);
        let body = node.child_by_field_name("body")?;

        if name.is_empty() {
            return None;
        }

        Some(StructDef {
            name,
            fields: self.extract_fields(body, source),
        })
    }

    fn extract_fields(&self, node: Node, source: &str) -> Vec<StructField> {
        let mut fields = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "field_declaration" {
                fields.extend(self.extract_field(child, source));
            }
        }
        fields
    }

    fn extract_field(&self, node: Node, source: &str) -> Vec<StructField> {
        let base = self.base_type(node, source);
        let mut fields = Vec::new();

        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let (name, type_name) = self.describe_declarator(declarator, base.clone(), source);
            if name.is_empty() {
                continue;
            }
            fields.push(StructField { name, type_name });
        }
        fields
    }

    fn node_text(&self, node: Node, source: &str) -> String {
        node.utf8_text(source.as_bytes())
            .unwrap_or("")
            .to_string()
    }
}

/// True when `node` is the name being declared rather than a use of it,
/// e.g. `x` in `int x = y;` or `f` in `int f(int n);`
fn is_declared_name(node: Node) -> bool {
    node.parent()
        .and_then(|parent| parent.child_by_field_name("declarator"))
        .map_or(false, |declarator| declarator == node)
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::Parser for TreeSitterParser {
    fn parse(&self, source: &str, filename: &str) -> Result<ParseResult> {
        self.parse_source(source, filename)
    }

    fn name(&self) -> &str {
        "tree-sitter"
    }
}
