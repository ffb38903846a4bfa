//! Source text preprocessor
//!
//! A deliberately simplified C preprocessor that normalizes source before
//! structural parsing. Every call runs three passes in order:
//!
//! 1. `#include` expansion against the include search path
//! 2. whole-word object-like macro substitution
//! 3. conditional block elision
//!
//! Each include spec expands at most once per [`Preprocessor`] instance. The
//! second occurrence of the same spec anywhere in the call tree becomes empty
//! text until [`Preprocessor::reset`] is called.

pub mod conditionals;
pub mod headers;
pub mod macros;

pub use conditionals::strip_conditionals;
pub use headers::{IncludeSearchPath, ResolvedHeader};
pub use macros::MacroTable;

use cmigrate_core::{PreprocessorConfig, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

const INCLUDE_PATTERN: &str = r#"#include\s*[<"]([^>"]+)[>"]"#;

/// An `#include` directive found in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Byte range of the whole directive
    pub span: Range<usize>,
    /// Text between the delimiters
    pub spec: String,
}

/// Stateful preprocessor context
pub struct Preprocessor {
    macros: MacroTable,
    include_paths: IncludeSearchPath,
    processed_includes: HashSet<String>,
    include_re: Regex,
}

/// One source text whose includes are being expanded
struct Frame {
    source: String,
    directives: Vec<IncludeDirective>,
    next: usize,
    cursor: usize,
    output: String,
    file: PathBuf,
}

impl Preprocessor {
    /// Create an empty preprocessor: no macros, no include directories
    pub fn new() -> Self {
        Self {
            macros: MacroTable::new(),
            include_paths: IncludeSearchPath::new(),
            processed_includes: HashSet::new(),
            include_re: Regex::new(INCLUDE_PATTERN).expect("include pattern is valid"),
        }
    }

    /// Create a preprocessor from configuration
    pub fn from_config(config: &PreprocessorConfig) -> Self {
        let mut pp = Self::new();
        for def in &config.macros {
            pp.define_macro(&def.name, &def.value);
        }
        for dir in &config.include_paths {
            pp.add_include_path(dir.clone());
        }
        pp
    }

    /// Define an object-like macro
    pub fn define_macro(&mut self, name: &str, value: &str) {
        debug!("Defining macro {} = {:?}", name, value);
        self.macros.define(name, value);
    }

    /// Append a directory to the include search path
    pub fn add_include_path(&mut self, path: impl Into<PathBuf>) {
        self.include_paths.add(path);
    }

    /// Clear macros, include directories and the processed-includes set
    pub fn reset(&mut self) {
        self.macros.clear();
        self.include_paths.clear();
        self.processed_includes.clear();
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        self.include_paths.dirs()
    }

    /// Whether `spec` has already been expanded by this instance
    pub fn is_processed(&self, spec: &str) -> bool {
        self.processed_includes.contains(spec)
    }

    /// Find all `#include` directives in `source`
    pub fn scan_includes(&self, source: &str) -> Vec<IncludeDirective> {
        self.include_re
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let spec = caps.get(1)?;
                Some(IncludeDirective {
                    span: whole.range(),
                    spec: spec.as_str().to_string(),
                })
            })
            .collect()
    }

    /// Read and preprocess a file.
    ///
    /// A file that cannot be read is logged and yields empty text.
    pub fn process_file(&mut self, path: &Path) -> String {
        match self.try_process_file(path) {
            Ok(text) => text,
            Err(e) => {
                error!("Error processing file {}: {}", path.display(), e);
                String::new()
            }
        }
    }

    /// Read and preprocess a file, reporting a failed top-level read
    pub fn try_process_file(&mut self, path: &Path) -> Result<String> {
        let source = fs::read_to_string(path)?;
        Ok(self.process_source(&source, path))
    }

    /// Preprocess `source`, which was read from `current_file`
    pub fn process_source(&mut self, source: &str, current_file: &Path) -> String {
        let expanded = self.expand_includes(source, current_file);
        self.finish(&expanded)
    }

    /// Macro substitution and conditional elision, applied to every text
    /// once its includes have been spliced in
    fn finish(&self, text: &str) -> String {
        let text = self.macros.expand(text);
        strip_conditionals(&text)
    }

    fn frame(&self, source: String, file: PathBuf) -> Frame {
        let directives = self.scan_includes(&source);
        Frame {
            output: String::with_capacity(source.len()),
            source,
            directives,
            next: 0,
            cursor: 0,
            file,
        }
    }

    /// Expand includes depth-first, left to right, using an explicit stack.
    ///
    /// An included header runs through the full pipeline before being
    /// spliced into its parent. The top-level text is returned before its
    /// own macro and conditional passes.
    fn expand_includes(&mut self, source: &str, current_file: &Path) -> String {
        let mut stack = vec![self.frame(source.to_string(), current_file.to_path_buf())];

        loop {
            let Some(top) = stack.last_mut() else {
                return String::new();
            };

            if top.next < top.directives.len() {
                let directive = top.directives[top.next].clone();
                top.next += 1;
                top.output
                    .push_str(&top.source[top.cursor..directive.span.start]);
                top.cursor = directive.span.end;

                if self.processed_includes.contains(&directive.spec) {
                    continue;
                }
                self.processed_includes.insert(directive.spec.clone());

                match self.include_paths.load(&directive.spec) {
                    Some(header) => {
                        debug!(
                            "Expanding {} from {} into {}",
                            directive.spec,
                            header.path.display(),
                            top.file.display()
                        );
                        let child = self.frame(header.content, header.path);
                        stack.push(child);
                    }
                    None => {
                        warn!("Could not find include file: {}", directive.spec);
                        let text = &top.source[directive.span.clone()];
                        top.output.push_str(text);
                    }
                }
                continue;
            }

            let mut done = match stack.pop() {
                Some(frame) => frame,
                None => return String::new(),
            };
            done.output.push_str(&done.source[done.cursor..]);

            match stack.last_mut() {
                Some(parent) => {
                    let finished = self.finish(&done.output);
                    parent.output.push_str(&finished);
                }
                None => return done.output,
            }
        }
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmigrate_core::MacroDefinition;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn include_dir(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            let path = temp.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        temp
    }

    #[test]
    fn test_macro_word_boundary() {
        let mut pp = Preprocessor::new();
        pp.define_macro("MAXLEN", "100");

        let main = Path::new("main.c");
        assert_eq!(pp.process_source("int buf[MAXLEN];", main), "int buf[100];");
        assert_eq!(
            pp.process_source("int buf[MAXLENGTH];", main),
            "int buf[MAXLENGTH];"
        );
    }

    #[test]
    fn test_include_expanded_in_place() {
        let dir = include_dir(&[("defs.h", "int shared;")]);
        let mut pp = Preprocessor::new();
        pp.add_include_path(dir.path());

        let out = pp.process_source("#include \"defs.h\"\nint main;", Path::new("main.c"));
        assert_eq!(out, "int shared;\nint main;");
        assert!(pp.is_processed("defs.h"));
    }

    #[test]
    fn test_repeat_include_collapses() {
        let dir = include_dir(&[("defs.h", "int shared;")]);
        let mut pp = Preprocessor::new();
        pp.add_include_path(dir.path());

        let source = "#include <defs.h>\n#include \"defs.h\"\nint x;";
        let out = pp.process_source(source, Path::new("main.c"));
        assert_eq!(out, "int shared;\n\nint x;");

        // Processed set persists across calls
        let again = pp.process_source("#include <defs.h>", Path::new("other.c"));
        assert_eq!(again, "");
    }

    #[test]
    fn test_reset_and_fresh_instance_expand_again() {
        let dir = include_dir(&[("defs.h", "int shared;")]);
        let mut pp = Preprocessor::new();
        pp.add_include_path(dir.path());
        pp.process_source("#include <defs.h>", Path::new("a.c"));

        pp.reset();
        assert!(pp.include_paths().is_empty());
        assert!(!pp.is_processed("defs.h"));
        pp.add_include_path(dir.path());
        assert_eq!(pp.process_source("#include <defs.h>", Path::new("a.c")), "int shared;");

        let mut fresh = Preprocessor::new();
        fresh.add_include_path(dir.path());
        assert_eq!(
            fresh.process_source("#include <defs.h>", Path::new("a.c")),
            "int shared;"
        );
    }

    #[test]
    fn test_missing_include_left_unchanged() {
        let mut pp = Preprocessor::new();
        let source = "#include <nowhere.h>\nint x;";
        assert_eq!(pp.process_source(source, Path::new("main.c")), source);
        // Marked processed even though unresolved
        assert_eq!(pp.process_source("#include <nowhere.h>", Path::new("main.c")), "");
    }

    #[test]
    fn test_nested_includes_and_cycles() {
        let dir = include_dir(&[
            ("a.h", "#include \"b.h\"\nint a;"),
            ("b.h", "#include \"a.h\"\nint b;"),
        ]);
        let mut pp = Preprocessor::new();
        pp.add_include_path(dir.path());

        let out = pp.process_source("#include \"a.h\"\nint main;", Path::new("main.c"));
        assert_eq!(out, "\nint b;\nint a;\nint main;");
    }

    #[test]
    fn test_header_runs_full_pipeline() {
        let dir = include_dir(&[(
            "cfg.h",
            "#ifdef OLD\nint legacy;\n#endif\nint size = SIZE;",
        )]);
        let mut pp = Preprocessor::new();
        pp.add_include_path(dir.path());
        pp.define_macro("SIZE", "64");

        let out = pp.process_source("#include \"cfg.h\"\nchar buf[SIZE];", Path::new("m.c"));
        assert_eq!(out, "int size = 64;\nchar buf[64];");
    }

    #[test]
    fn test_conditionals_skipped() {
        let mut pp = Preprocessor::new();
        let source = "int a;\n#if defined(X)\nint b;\n#endif\nint c;";
        assert_eq!(pp.process_source(source, Path::new("m.c")), "int a;\nint c;");
    }

    #[test]
    fn test_deep_include_chain() {
        let mut files = Vec::new();
        for i in 0..500 {
            files.push((
                format!("h{}.h", i),
                format!("#include \"h{}.h\"\nint v{};", i + 1, i),
            ));
        }
        files.push(("h500.h".to_string(), "int last;".to_string()));
        let refs: Vec<(&str, &str)> = files
            .iter()
            .map(|(n, c)| (n.as_str(), c.as_str()))
            .collect();
        let dir = include_dir(&refs);

        let mut pp = Preprocessor::new();
        pp.add_include_path(dir.path());
        let out = pp.process_source("#include \"h0.h\"", Path::new("m.c"));
        assert!(out.starts_with("int last;\nint v499;"));
        assert!(out.ends_with("int v0;"));
    }

    #[test]
    fn test_process_file_missing_is_empty() {
        let mut pp = Preprocessor::new();
        assert_eq!(pp.process_file(Path::new("/definitely/not/here.c")), "");
        assert!(pp.try_process_file(Path::new("/definitely/not/here.c")).is_err());
    }

    #[test]
    fn test_process_file_reads_source() {
        let dir = include_dir(&[("main.c", "int x = LIMIT;")]);
        let mut pp = Preprocessor::from_config(&PreprocessorConfig {
            macros: vec![MacroDefinition::with_value("LIMIT", "8")],
            include_paths: vec![],
        });
        assert_eq!(pp.process_file(&dir.path().join("main.c")), "int x = 8;");
    }

    #[test]
    fn test_scan_includes() {
        let pp = Preprocessor::new();
        let found = pp.scan_includes("#include <stdio.h>\n#include\"local.h\"\n");
        let specs: Vec<_> = found.iter().map(|d| d.spec.as_str()).collect();
        assert_eq!(specs, vec!["stdio.h", "local.h"]);
        assert_eq!(found[0].span, 0..18);
    }
}
