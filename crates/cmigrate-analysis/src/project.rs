//! Project analysis
//!
//! Walks a project, normalizes every source file, parses it, and feeds the
//! results into a [`SymbolTable`] and a [`DependencyMapper`].
//!
//! Each file is analyzed on its own text. `#include` directives are not
//! spliced in here; they are resolved to project files and recorded as
//! direct dependency edges, so a header's definitions stay attributed to the
//! header.

use cmigrate_core::{canonicalize, Config, Error, Result};
use cmigrate_index::{DependencyMapper, SymbolScope, SymbolTable};
use cmigrate_parser::preprocessor::IncludeSearchPath;
use cmigrate_parser::{ParseResult, Parser, Preprocessor, TreeSitterParser};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Everything learned about a project
#[derive(Debug, Default)]
pub struct ProjectAnalysis {
    /// Canonical paths of analyzed files, in discovery order
    pub files: Vec<PathBuf>,
    /// Normalized text of each analyzed file
    pub sources: HashMap<PathBuf, String>,
    pub symbols: SymbolTable,
    pub dependencies: DependencyMapper,
    /// Non-fatal read and parse problems
    pub errors: Vec<String>,
}

/// Drives discovery, preprocessing, parsing and indexing
pub struct ProjectAnalyzer {
    config: Config,
    excluded: GlobSet,
    parser: TreeSitterParser,
}

impl ProjectAnalyzer {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.parser.exclude_dirs {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::Config(format!("bad exclude pattern {:?}: {}", pattern, e)))?;
            builder.add(glob);
        }
        let excluded = builder
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            config,
            excluded,
            parser: TreeSitterParser::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self.excluded.is_match(entry.file_name())
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.config.parser.extensions.iter().any(|x| x == e))
            .unwrap_or(false)
    }

    /// Source files under the project root, sorted
    pub fn discover_files(&self) -> Vec<PathBuf> {
        let root = &self.config.project_root;
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && self.has_source_extension(e.path()))
            .map(|e| canonicalize(e.path()))
            .collect();

        files.sort();
        files.dedup();
        debug!("Discovered {} source files under {}", files.len(), root.display());
        files
    }

    /// Discover and analyze the whole project
    pub fn analyze(&self) -> ProjectAnalysis {
        let files = self.discover_files();
        self.analyze_files(&files)
    }

    /// Analyze the given files
    pub fn analyze_files(&self, files: &[PathBuf]) -> ProjectAnalysis {
        let mut analysis = ProjectAnalysis::default();
        let files: Vec<PathBuf> = files.iter().map(|f| canonicalize(f)).collect();
        let project: BTreeSet<&PathBuf> = files.iter().collect();

        let mut search_path = IncludeSearchPath::new();
        for dir in &self.config.preprocessor.include_paths {
            search_path.add(dir.clone());
        }

        // Macros only; includes are tracked as edges instead of being spliced
        let macros_only = cmigrate_core::PreprocessorConfig {
            macros: self.config.preprocessor.macros.clone(),
            include_paths: Vec::new(),
        };
        let mut preprocessor = Preprocessor::from_config(&macros_only);

        let mut normalized: Vec<(PathBuf, String)> = Vec::with_capacity(files.len());
        for file in &files {
            let raw = match fs::read_to_string(file) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Error reading {}: {}", file.display(), e);
                    analysis.errors.push(format!("{}: {}", file.display(), e));
                    continue;
                }
            };

            analysis.dependencies.add_file(file);

            let directives = preprocessor.scan_includes(&raw);
            let mut body = String::with_capacity(raw.len());
            let mut cursor = 0;
            for directive in &directives {
                body.push_str(&raw[cursor..directive.span.start]);
                cursor = directive.span.end;

                match search_path.resolve_from(&directive.spec, file) {
                    Some(target) => {
                        let target = canonicalize(target);
                        if project.contains(&target) {
                            analysis.dependencies.add_file_dependency(file, &target);
                        }
                    }
                    None => debug!("{}: include {} not in project", file.display(), directive.spec),
                }
            }
            body.push_str(&raw[cursor..]);

            let text = preprocessor.process_source(&body, file);
            normalized.push((file.clone(), text));
        }

        let parsed: Vec<(PathBuf, Result<ParseResult>)> = normalized
            .par_iter()
            .map(|(file, text)| {
                let result = self.parser.parse(text, &file.to_string_lossy());
                (file.clone(), result)
            })
            .collect();

        let mut results: Vec<(PathBuf, ParseResult)> = Vec::with_capacity(parsed.len());
        for (file, result) in parsed {
            match result {
                Ok(result) => {
                    analysis.errors.extend(result.errors.iter().cloned());
                    results.push((file, result));
                }
                Err(e) => {
                    warn!("Error parsing {}: {}", file.display(), e);
                    analysis.errors.push(format!("{}: {}", file.display(), e));
                }
            }
        }

        // Definitions first, so references in any file can see every definer
        for (file, result) in &results {
            self.record_definitions(&mut analysis, file, result);
        }
        for (file, result) in &results {
            self.record_references(&mut analysis, file, result);
        }

        info!(
            "Analyzed {} files: {} symbols, {} dependencies",
            results.len(),
            analysis.symbols.len(),
            analysis.dependencies.edge_count()
        );

        analysis.files = results.iter().map(|(f, _)| f.clone()).collect();
        analysis.sources = normalized.into_iter().collect();
        analysis
    }

    fn record_definitions(&self, analysis: &mut ProjectAnalysis, file: &Path, result: &ParseResult) {
        for func in &result.functions {
            analysis.symbols.add_function(func);
            analysis.dependencies.add_symbol_definition(file, &func.name);
        }
        for st in &result.structs {
            analysis.symbols.add_struct(st);
            analysis.dependencies.add_symbol_definition(file, &st.name);
        }
        for decl in result.declarations.iter().filter(|d| d.is_definition()) {
            analysis.symbols.add_variable(decl, SymbolScope::Global);
            analysis.dependencies.add_symbol_definition(file, &decl.name);
        }
    }

    fn record_references(&self, analysis: &mut ProjectAnalysis, file: &Path, result: &ParseResult) {
        let own = analysis.dependencies.get_file_symbols(file);
        let display = file.display().to_string();

        for name in &result.references {
            if own.contains(name) {
                continue;
            }
            analysis.dependencies.add_symbol_reference(file, name);
            analysis.symbols.add_reference(name, display.clone());
        }
    }
}
