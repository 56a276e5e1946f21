//! Prompt Loader
//!
//! Loads prompt templates from the user override directory or falls back to
//! embedded defaults.

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Variables for the decomposition prompt
#[derive(Debug, Clone, Serialize)]
pub struct DecomposeContext {
    pub description: String,
}

/// One completion step listed in the palace prompt
#[derive(Debug, Clone, Serialize)]
pub struct PalaceStep {
    pub order: i64,
    pub title: String,
    pub time_estimate: Option<i64>,
}

/// Variables for the complete palace prompt
#[derive(Debug, Clone, Serialize)]
pub struct PalaceContext {
    pub title: String,
    pub category: String,
    pub complexity: i64,
    /// Sub-tasks sorted by order
    pub steps: Vec<PalaceStep>,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `~/.config/palacebuilder/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `user_dir` before the embedded prompts
    pub fn new(user_dir: Option<PathBuf>) -> Self {
        debug!(?user_dir, "PromptLoader::new: called");
        let user_dir = user_dir.filter(|dir| {
            let exists = dir.exists();
            debug!(?dir, %exists, "PromptLoader::new: checking user override directory");
            exists
        });

        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);

        Self { hbs, user_dir }
    }

    /// Create a loader using the standard override location
    pub fn from_default_dirs() -> Self {
        debug!("PromptLoader::from_default_dirs: called");
        Self::new(dirs::config_dir().map(|dir| dir.join("palacebuilder").join("prompts")))
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self::new(None)
    }

    /// Load a template by name
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found in user override");
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        let rendered = self
            .hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))?;
        Ok(rendered.trim().to_string())
    }

    /// Render the decomposition prompt for a task description
    pub fn decompose_prompt(&self, description: &str) -> Result<String> {
        debug!("PromptLoader::decompose_prompt: called");
        self.render(
            "decompose",
            &DecomposeContext {
                description: description.to_string(),
            },
        )
    }

    /// Render the complete palace prompt
    pub fn palace_prompt(&self, context: &PalaceContext) -> Result<String> {
        debug!(title = %context.title, steps = context.steps.len(), "PromptLoader::palace_prompt: called");
        self.render("palace", context)
    }
}
