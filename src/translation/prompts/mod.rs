/*!
 * Prompt construction for the translate and review stages.
 */

pub mod templates;

pub use templates::{one_line, PromptTemplate, ReviewPromptBuilder, TranslationPromptBuilder};
