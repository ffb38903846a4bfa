//! cmigrate CLI
//!
//! Command-line interface for preprocessing and dependency analysis of C
//! projects.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cmigrate_analysis::{ProjectAnalysis, ProjectAnalyzer, TranslationPlanner};
use cmigrate_core::{Config, MacroDefinition};
use cmigrate_index::{SymbolKind, SymbolScope};
use cmigrate_parser::Preprocessor;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cmigrate")]
#[command(author, version, about = "C preprocessing and dependency analysis", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Options shared by every subcommand that walks a project
#[derive(Args)]
struct ProjectArgs {
    /// Project root
    #[arg(value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Define a macro (NAME or NAME=VALUE)
    #[arg(short = 'D', value_name = "NAME[=VALUE]")]
    define: Vec<MacroDefinition>,

    /// Add an include search directory
    #[arg(short = 'I', value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,
}

impl ProjectArgs {
    fn config(&self) -> Config {
        let mut config = Config::for_project(&self.root);
        config.preprocessor.macros = self.define.clone();
        config.preprocessor.include_paths = self.include.clone();
        config
    }

    fn analyze(&self) -> Result<ProjectAnalysis> {
        let analyzer = ProjectAnalyzer::new(self.config())?;
        let analysis = analyzer.analyze();
        for error in &analysis.errors {
            eprintln!("warning: {}", error);
        }
        Ok(analysis)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess a single file and print the result
    Preprocess {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Define a macro (NAME or NAME=VALUE)
        #[arg(short = 'D', value_name = "NAME[=VALUE]")]
        define: Vec<MacroDefinition>,

        /// Add an include search directory
        #[arg(short = 'I', value_name = "DIR")]
        include: Vec<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List symbols defined in a project
    Symbols {
        #[command(flatten)]
        project: ProjectArgs,

        /// Only show this kind (variable, function, type, struct)
        #[arg(long)]
        kind: Option<SymbolKind>,

        /// Only show this scope (global, function, block)
        #[arg(long)]
        scope: Option<SymbolScope>,
    },

    /// Show dependencies and dependents of each file
    Deps {
        #[command(flatten)]
        project: ProjectArgs,

        /// Only show this file
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Print files in dependency order
    Order {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Print groups of mutually dependent files
    Components {
        #[command(flatten)]
        project: ProjectArgs,

        /// Group by one-directional reachability instead
        #[arg(long)]
        reachability: bool,

        /// Only show groups with more than one file
        #[arg(long)]
        cycles_only: bool,
    },

    /// Build a translation plan
    Plan {
        #[command(flatten)]
        project: ProjectArgs,

        /// Target language named in the prompts
        #[arg(short, long, default_value = "Python")]
        target: String,

        /// Print full prompts in text output
        #[arg(long)]
        prompts: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Preprocess {
            file,
            define,
            include,
            output,
        } => cmd_preprocess(&file, define, include, output.as_deref()),
        Commands::Symbols {
            project,
            kind,
            scope,
        } => cmd_symbols(&project, kind, scope),
        Commands::Deps { project, file } => cmd_deps(&project, file.as_deref()),
        Commands::Order { project } => cmd_order(&project),
        Commands::Components {
            project,
            reachability,
            cycles_only,
        } => cmd_components(&project, reachability, cycles_only),
        Commands::Plan {
            project,
            target,
            prompts,
        } => cmd_plan(&project, &target, prompts),
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_preprocess(
    file: &Path,
    define: Vec<MacroDefinition>,
    include: Vec<PathBuf>,
    output: Option<&Path>,
) -> Result<()> {
    let config = cmigrate_core::PreprocessorConfig {
        macros: define,
        include_paths: include,
    };
    let mut preprocessor = Preprocessor::from_config(&config);
    let text = preprocessor
        .try_process_file(file)
        .with_context(|| format!("failed to preprocess {}", file.display()))?;

    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Output written to: {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn cmd_symbols(
    project: &ProjectArgs,
    kind: Option<SymbolKind>,
    scope: Option<SymbolScope>,
) -> Result<()> {
    let analysis = project.analyze()?;
    let symbols: Vec<_> = analysis
        .symbols
        .get_all_symbols()
        .iter()
        .filter(|s| kind.map_or(true, |k| s.kind == k))
        .filter(|s| scope.map_or(true, |sc| s.scope == sc))
        .collect();

    if project.format == Format::Json {
        return print_json(&symbols);
    }

    for symbol in &symbols {
        println!(
            "{:<24} {:<9} {:<7} {}",
            symbol.name, symbol.kind, symbol.scope, symbol.type_info
        );
        for file in &symbol.referencing_files {
            println!("    used in {}", file);
        }
    }
    println!("\n{} symbols", symbols.len());
    Ok(())
}

fn cmd_deps(project: &ProjectArgs, file: Option<&Path>) -> Result<()> {
    let analysis = project.analyze()?;
    let mut entries = analysis.dependencies.snapshot();
    if let Some(file) = file {
        let wanted = cmigrate_core::canonicalize(file);
        entries.retain(|e| e.path == wanted);
        if entries.is_empty() {
            anyhow::bail!("{} is not part of the project", file.display());
        }
    }

    if project.format == Format::Json {
        return print_json(&entries);
    }

    for entry in &entries {
        println!("{}", entry.path.display());
        for dep in &entry.dependencies {
            println!("  -> {}", dep.display());
        }
        for dependent in &entry.dependents {
            println!("  <- {}", dependent.display());
        }
    }
    Ok(())
}

fn cmd_order(project: &ProjectArgs) -> Result<()> {
    let analysis = project.analyze()?;
    let order = analysis.dependencies.get_dependency_order();

    if project.format == Format::Json {
        return print_json(&order);
    }

    for (i, file) in order.iter().enumerate() {
        println!("{:>4}. {}", i + 1, file.display());
    }
    Ok(())
}

fn cmd_components(project: &ProjectArgs, reachability: bool, cycles_only: bool) -> Result<()> {
    let analysis = project.analyze()?;
    let mut groups = if reachability {
        analysis.dependencies.get_reachability_groups()
    } else {
        analysis.dependencies.get_strongly_connected_components()
    };
    if cycles_only {
        groups.retain(|g| g.len() > 1);
    }

    if project.format == Format::Json {
        return print_json(&groups);
    }

    for (i, group) in groups.iter().enumerate() {
        println!("group {} ({} files)", i + 1, group.len());
        for file in group {
            println!("  {}", file.display());
        }
    }
    Ok(())
}

fn cmd_plan(project: &ProjectArgs, target: &str, prompts: bool) -> Result<()> {
    let analysis = project.analyze()?;
    let plan = TranslationPlanner::new(target).plan(&analysis);

    if project.format == Format::Json {
        return print_json(&plan);
    }

    for (i, unit) in plan.units.iter().enumerate() {
        println!("{:>4}. {}", i + 1, unit.file.display());
        for dep in &unit.dependencies {
            println!("        needs {}", dep.display());
        }
        if prompts {
            println!("{}\n", unit.prompt);
        }
    }
    if !plan.cycles.is_empty() {
        println!("\n{} dependency cycles:", plan.cycles.len());
        for cycle in &plan.cycles {
            let files: Vec<_> = cycle.iter().map(|f| f.display().to_string()).collect();
            println!("  {}", files.join(", "));
        }
    }
    Ok(())
}
