//! Prompt templates and prompt assembly.
//!
//! - **language**: the supported answer languages
//! - **templates**: the language-keyed template store (built-in or JSON file)
//! - **builder**: renders the final prompt from a request's hints

mod builder;
mod language;
mod templates;

pub use builder::PromptBuilder;
pub use language::Language;
pub use templates::{PromptTemplate, PromptTemplates};
