//! Translation planning
//!
//! Turns a [`ProjectAnalysis`] into an ordered list of prompts, one per file,
//! and feeds them to a [`LanguageModel`]. Files come out in dependency order,
//! so a file is always translated after the files it needs.

use crate::project::ProjectAnalysis;
use cmigrate_core::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Something that turns a prompt into text
pub trait LanguageModel {
    fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String>;
}

/// System and user prompt pair with `{placeholder}` slots
///
/// Recognized placeholders: `{file_path}`, `{dependencies}`, `{code}` and
/// `{target_language}`. Unknown placeholders are left as they are.
#[derive(Debug, Clone, Serialize)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: "You are an expert code translator specializing in converting C code to \
                     {target_language}. Preserve functionality, follow the idioms of the \
                     target language and keep the code readable."
                .to_string(),
            user: "Translate the following C code to {target_language}:\n\n{code}\n\n\
                   Additional context:\n- File: {file_path}\n- Dependencies: {dependencies}\n"
                .to_string(),
        }
    }
}

impl PromptTemplate {
    fn fill(text: &str, vars: &[(&str, &str)]) -> String {
        let mut out = text.to_string();
        for (key, value) in vars {
            out = out.replace(&format!("{{{}}}", key), value);
        }
        out
    }

    pub fn render_system(&self, target_language: &str) -> String {
        Self::fill(&self.system, &[("target_language", target_language)])
    }

    pub fn render_user(
        &self,
        file_path: &str,
        dependencies: &str,
        code: &str,
        target_language: &str,
    ) -> String {
        // `code` last so placeholders inside the source text stay untouched
        let head = Self::fill(
            &self.user,
            &[
                ("file_path", file_path),
                ("dependencies", dependencies),
                ("target_language", target_language),
            ],
        );
        head.replace("{code}", code)
    }
}

/// One file ready to be translated
#[derive(Debug, Clone, Serialize)]
pub struct TranslationUnit {
    pub file: PathBuf,
    pub dependencies: Vec<PathBuf>,
    pub system_prompt: String,
    pub prompt: String,
}

/// Ordered translation work for a project
#[derive(Debug, Clone, Default, Serialize)]
pub struct TranslationPlan {
    pub units: Vec<TranslationUnit>,
    /// Groups of mutually dependent files, translated in no particular order
    pub cycles: Vec<BTreeSet<PathBuf>>,
}

/// Result of running a plan against a model
#[derive(Debug, Default)]
pub struct TranslationReport {
    pub translated: Vec<(PathBuf, String)>,
    pub failed: Vec<(PathBuf, String)>,
}

pub struct TranslationPlanner {
    template: PromptTemplate,
    target_language: String,
}

impl TranslationPlanner {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            template: PromptTemplate::default(),
            target_language: target_language.into(),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn plan(&self, analysis: &ProjectAnalysis) -> TranslationPlan {
        let system_prompt = self.template.render_system(&self.target_language);
        let mut units = Vec::new();

        for file in analysis.dependencies.get_dependency_order() {
            let Some(code) = analysis.sources.get(&file) else {
                debug!("No source for {}, not planned", file.display());
                continue;
            };

            let dependencies: Vec<PathBuf> = analysis
                .dependencies
                .get_file_dependencies(&file)
                .into_iter()
                .collect();
            let dep_list = if dependencies.is_empty() {
                "none".to_string()
            } else {
                dependencies
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            let prompt = self.template.render_user(
                &file.display().to_string(),
                &dep_list,
                code,
                &self.target_language,
            );
            units.push(TranslationUnit {
                file,
                dependencies,
                system_prompt: system_prompt.clone(),
                prompt,
            });
        }

        let cycles = analysis.dependencies.find_cycles();
        info!("Planned {} units, {} cycles", units.len(), cycles.len());
        TranslationPlan { units, cycles }
    }
}

/// Run every unit of `plan` through `model`, in order
pub fn translate(plan: &TranslationPlan, model: &dyn LanguageModel) -> TranslationReport {
    let mut report = TranslationReport::default();
    for unit in &plan.units {
        match model.generate(&unit.prompt, &unit.system_prompt) {
            Ok(text) => report.translated.push((unit.file.clone(), text)),
            Err(e) => {
                warn!("Translation of {} failed: {}", unit.file.display(), e);
                report.failed.push((unit.file.clone(), e.to_string()));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmigrate_core::Error;
    use cmigrate_index::DependencyMapper;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    struct EchoModel {
        seen: RefCell<Vec<String>>,
    }

    impl LanguageModel for EchoModel {
        fn generate(&self, prompt: &str, _system: &str) -> Result<String> {
            self.seen.borrow_mut().push(prompt.to_string());
            if prompt.contains("broken") {
                return Err(Error::Model("refused".into()));
            }
            Ok(format!("# {}", prompt.len()))
        }
    }

    fn analysis() -> ProjectAnalysis {
        let mut deps = DependencyMapper::new();
        deps.add_file_dependency("/p/main.c", "/p/util.c");
        deps.add_file_dependency("/p/util.c", "/p/util.h");

        let mut sources = std::collections::HashMap::new();
        sources.insert(PathBuf::from("/p/main.c"), "int main(void) { return helper(); }".to_string());
        sources.insert(PathBuf::from("/p/util.c"), "int helper(void) { return 0; }".to_string());
        sources.insert(PathBuf::from("/p/util.h"), "int helper(void);".to_string());

        ProjectAnalysis {
            sources,
            dependencies: deps,
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_follows_dependency_order() {
        let plan = TranslationPlanner::new("Python").plan(&analysis());

        let files: Vec<_> = plan.units.iter().map(|u| u.file.clone()).collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/p/util.h"),
                PathBuf::from("/p/util.c"),
                PathBuf::from("/p/main.c"),
            ]
        );
        assert!(plan.cycles.is_empty());

        let main = &plan.units[2];
        assert_eq!(main.dependencies, vec![PathBuf::from("/p/util.c")]);
        assert!(main.prompt.contains("- File: /p/main.c"));
        assert!(main.prompt.contains("- Dependencies: /p/util.c"));
        assert!(main.prompt.contains("return helper();"));
        assert!(main.system_prompt.contains("to Python"));
        assert!(plan.units[0].prompt.contains("- Dependencies: none"));
    }

    #[test]
    fn test_files_without_source_are_skipped() {
        let mut analysis = analysis();
        analysis.sources.remove(&PathBuf::from("/p/util.h"));

        let plan = TranslationPlanner::new("Rust").plan(&analysis);
        assert_eq!(plan.units.len(), 2);
    }

    #[test]
    fn test_cycles_are_reported() {
        let mut analysis = analysis();
        analysis.dependencies.add_file_dependency("/p/util.h", "/p/main.c");

        let plan = TranslationPlanner::new("Rust").plan(&analysis);
        assert_eq!(plan.units.len(), 3);
        assert_eq!(plan.cycles.len(), 1);
        assert_eq!(plan.cycles[0].len(), 3);
    }

    #[test]
    fn test_code_placeholders_are_not_expanded() {
        let template = PromptTemplate::default();
        let prompt = template.render_user("a.c", "none", "char *s = \"{file_path}\";", "Go");
        assert!(prompt.contains("\"{file_path}\""));
        assert!(prompt.contains("- File: a.c"));
    }

    #[test]
    fn test_model_failure_is_not_fatal() {
        let mut analysis = analysis();
        analysis
            .sources
            .insert(PathBuf::from("/p/util.c"), "/* broken */".to_string());

        let plan = TranslationPlanner::new("Python").plan(&analysis);
        let model = EchoModel {
            seen: RefCell::new(Vec::new()),
        };
        let report = translate(&plan, &model);

        assert_eq!(model.seen.borrow().len(), 3);
        assert_eq!(report.translated.len(), 2);
        assert_eq!(report.failed, vec![(PathBuf::from("/p/util.c"), "Model error: refused".to_string())]);
    }
}
