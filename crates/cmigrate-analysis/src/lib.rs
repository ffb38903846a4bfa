//! cmigrate Analysis
//!
//! Project-level driver on top of the parser and index crates:
//! - `project` - discovery, normalization, parallel parsing, indexing
//! - `translate` - dependency-ordered translation plans for a language model

pub mod project;
pub mod translate;

pub use project::{ProjectAnalysis, ProjectAnalyzer};
pub use translate::{
    translate, LanguageModel, PromptTemplate, TranslationPlan, TranslationPlanner,
    TranslationReport, TranslationUnit,
};
