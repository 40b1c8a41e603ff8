/*!
 * Prompt templates for subtitle translation and review.
 *
 * Every prompt lists the lines the model must answer as
 * `@@SUB_LINE@@ <n>: ...` and shows context lines in a different shape so
 * they can never be mistaken for requested output.
 */

use crate::language_utils::{display_name, ScriptFamily};
use crate::providers::ChatMessage;
use crate::subtitle_processor::Segment;
use crate::translation::batch::Batch;
use crate::translation::parser::LINE_MARKER;

/// System prompt template with `{source_language}` and `{target_language}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    /// Translate stage instructions.
    pub const SUBTITLE_TRANSLATOR: &'static str = r#"You are a professional subtitle translator working from {source_language} into {target_language}.

Rules:
- Translate every numbered line. Never skip, merge or split lines.
- Keep the numbering and the order exactly as given.
- Lines marked as context are for understanding only. Do not translate them.
- When a line is ambiguous, prefer the literal meaning.
- Use a formal register unless the dialogue is clearly informal.
- Keep [sound effects], (parentheticals) and names as they are.

Answer format: one line per numbered input line, exactly
@@SUB_LINE@@ <n>: <translation>
and nothing else."#;

    /// Review stage instructions.
    pub const SUBTITLE_REVIEWER: &'static str = r#"You are a subtitle editor reviewing a {target_language} translation of {source_language} dialogue.

For every numbered line you get the source text, the current draft, the cue duration and a character budget.

Rules:
- Fix mistranslations, grammar and inconsistent terminology.
- Shorten drafts that exceed their character budget without losing meaning.
- Soft merge: when two adjacent lines form one sentence that reads badly when split, you may write the same merged text for both IDs. Never change timing and never drop an ID.
- To keep a draft unchanged, leave the text after the colon empty.

Answer format: exactly one line per numbered input line,
@@SUB_LINE@@ <n>: <revised text>
and nothing else."#;

    pub fn subtitle_translator() -> Self {
        Self { template: Self::SUBTITLE_TRANSLATOR }
    }

    pub fn subtitle_reviewer() -> Self {
        Self { template: Self::SUBTITLE_REVIEWER }
    }

    /// Render the template with the given languages.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

/// Collapse internal line breaks so one cue stays on one prompt line.
pub fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn requested_line(id: usize, text: &str) -> String {
    format!("{} {}: {}", LINE_MARKER, id, one_line(text))
}

fn push_source_context(prompt: &mut String, title: &str, segments: &[Segment]) {
    if segments.is_empty() {
        return;
    }
    prompt.push_str(title);
    prompt.push('\n');
    for segment in segments {
        prompt.push_str(&format!("  [{}] {}\n", segment.index, one_line(&segment.original)));
    }
    prompt.push('\n');
}

fn push_review_context(prompt: &mut String, title: &str, segments: &[Segment]) {
    if segments.is_empty() {
        return;
    }
    prompt.push_str(title);
    prompt.push('\n');
    for segment in segments {
        prompt.push_str(&format!(
            "  [{}] SOURCE: {} | CURRENT: {}\n",
            segment.index,
            one_line(&segment.original),
            one_line(&segment.translation)
        ));
    }
    prompt.push('\n');
}

/// Builder for translate stage prompts.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: String,
    target_language: String,
}

impl TranslationPromptBuilder {
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: display_name(source_language),
            target_language: display_name(target_language),
        }
    }

    fn system(&self) -> ChatMessage {
        ChatMessage::system(
            PromptTemplate::subtitle_translator().render(&self.source_language, &self.target_language),
        )
    }

    /// Full batch prompt with context on both sides.
    pub fn build(&self, batch: &Batch) -> Vec<ChatMessage> {
        let mut prompt = String::new();
        push_source_context(&mut prompt, "Context before (do not translate):", &batch.context_before);

        prompt.push_str(&format!(
            "Translate these {} lines into {}:\n",
            batch.len(),
            self.target_language
        ));
        for segment in &batch.segments {
            prompt.push_str(&requested_line(segment.index, &segment.original));
            prompt.push('\n');
        }
        prompt.push('\n');

        push_source_context(&mut prompt, "Context after (do not translate):", &batch.context_after);
        prompt.push_str(&format!("Answer with exactly {} numbered lines.", batch.len()));

        vec![self.system(), ChatMessage::user(prompt)]
    }

    /// Narrow follow-up prompt for lines the first answer left unresolved.
    pub fn build_repair(&self, missing: &[&Segment]) -> Vec<ChatMessage> {
        let mut prompt = format!(
            "Your previous answer missed some lines. Translate only these {} lines into {}:\n",
            missing.len(),
            self.target_language
        );
        for segment in missing {
            prompt.push_str(&requested_line(segment.index, &segment.original));
            prompt.push('\n');
        }
        prompt.push_str(&format!("\nAnswer with exactly {} numbered lines.", missing.len()));

        vec![self.system(), ChatMessage::user(prompt)]
    }
}

/// Builder for review stage prompts.
#[derive(Debug, Clone)]
pub struct ReviewPromptBuilder {
    source_language: String,
    target_language: String,
    script: ScriptFamily,
}

impl ReviewPromptBuilder {
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: display_name(source_language),
            target_language: display_name(target_language),
            script: ScriptFamily::for_language(target_language),
        }
    }

    pub fn script(&self) -> ScriptFamily {
        self.script
    }

    /// Review prompt for one window.
    pub fn build(&self, batch: &Batch) -> Vec<ChatMessage> {
        let system = PromptTemplate::subtitle_reviewer().render(&self.source_language, &self.target_language);

        let mut prompt = String::new();
        push_review_context(&mut prompt, "Context before (do not revise):", &batch.context_before);

        prompt.push_str(&format!(
            "Review these {} lines (budget {:.0} characters per second):\n",
            batch.len(),
            self.script.cps_budget()
        ));
        for segment in &batch.segments {
            let duration = segment.duration();
            prompt.push_str(&format!(
                "{} {}: [{:.2}s | {} chars | max {} chars]\n",
                LINE_MARKER,
                segment.index,
                duration,
                segment.translation.chars().count(),
                self.script.max_chars_for(duration)
            ));
            prompt.push_str(&format!("SOURCE: {}\n", one_line(&segment.original)));
            prompt.push_str(&format!("DRAFT: {}\n", one_line(&segment.translation)));
        }
        prompt.push('\n');

        push_review_context(&mut prompt, "Context after (do not revise):", &batch.context_after);
        prompt.push_str(&format!("Answer with exactly {} numbered lines.", batch.len()));

        vec![ChatMessage::system(system), ChatMessage::user(prompt)]
    }
}
