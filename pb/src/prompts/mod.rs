//! Prompt Template System
//!
//! Renders the `.pmt` (prompt template) files used for task decomposition and
//! palace image generation.
//!
//! Template loading chain:
//! 1. `{config_dir}/palacebuilder/prompts/{name}.pmt` (user override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{DecomposeContext, PalaceContext, PalaceStep, PromptLoader};
