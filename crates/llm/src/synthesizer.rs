//! Spoken response synthesis
//!
//! Turns a directive plus conversational grounding into the literal next
//! utterance. The model is asked for spoken-register text, but the hard
//! constraints (two sentences, one terminal question, no lists) are
//! enforced here regardless of what comes back.

use std::sync::Arc;

use interviewer_core::Directive;

use crate::backend::{ReasoningBackend, ReasoningRequest};
use crate::prompt::{Message, PromptBuilder};
use crate::LlmError;

/// Sentinel prefix on closing utterances so the caller can trigger
/// end-of-session side effects before speaking.
pub const CLOSING_PREFIX: &str = "[[closing]] ";

/// Check whether an utterance is a closing remark
pub fn is_closing(text: &str) -> bool {
    text.starts_with(CLOSING_PREFIX)
}

/// Strip the closing sentinel, returning the speakable text
pub fn strip_closing(text: &str) -> &str {
    text.strip_prefix(CLOSING_PREFIX).unwrap_or(text)
}

/// Conversational grounding for one synthesis call
#[derive(Debug, Clone, Default)]
pub struct SynthesisContext {
    /// Skill to open with or pivot to (ignored for other directives)
    pub target_skill: String,
    /// The question the candidate just answered
    pub last_question: String,
    /// The candidate's last utterance
    pub last_answer: String,
}

/// Produces the next utterance to speak
pub struct ResponseSynthesizer {
    backend: Arc<dyn ReasoningBackend>,
    prompts: PromptBuilder,
}

impl ResponseSynthesizer {
    pub fn new(backend: Arc<dyn ReasoningBackend>, prompts: PromptBuilder) -> Self {
        Self { backend, prompts }
    }

    /// Synthesize the next utterance for a directive.
    ///
    /// Closing utterances come back with [`CLOSING_PREFIX`] prepended.
    pub async fn synthesize(
        &self,
        directive: Directive,
        context: &SynthesisContext,
    ) -> Result<String, LlmError> {
        let prompt = self.prompts.synthesis_prompt(
            directive,
            &context.target_skill,
            &context.last_question,
            &context.last_answer,
        );
        let request = ReasoningRequest::new(
            self.prompts.system_instruction(),
            vec![Message::user(prompt)],
        );

        let raw = self.backend.generate(&request).await?;
        let spoken = enforce_spoken_format(&raw, directive);
        if spoken.is_empty() {
            return Err(LlmError::InvalidResponse(
                "synthesis returned no speakable text".to_string(),
            ));
        }

        tracing::debug!(directive = %directive, chars = spoken.len(), "utterance synthesized");

        if directive == Directive::Conclude {
            Ok(format!("{}{}", CLOSING_PREFIX, spoken))
        } else {
            Ok(spoken)
        }
    }
}

/// Enforce spoken formatting on model output.
///
/// Questions end with exactly one terminal question mark; closing remarks
/// end with a statement. List markers and markdown survive badly in TTS, so
/// they are stripped before sentence selection.
fn enforce_spoken_format(raw: &str, directive: Directive) -> String {
    let flat = strip_markup(raw);
    let sentences = split_sentences(&flat);
    if sentences.is_empty() {
        return String::new();
    }

    if directive == Directive::Conclude {
        // Closing remark: up to two sentences, no trailing question
        let mut out = sentences.into_iter().take(2).collect::<Vec<_>>().join(" ");
        if out.ends_with('?') {
            out.pop();
            out.push('.');
        }
        return out;
    }

    // Ordinary turn: at most one lead-in statement plus the question
    match sentences.iter().position(|s| s.ends_with('?')) {
        Some(i) => {
            let mut out = Vec::with_capacity(2);
            if i > 0 {
                out.push(sentences[i - 1].clone());
            }
            out.push(sentences[i].clone());
            out.join(" ")
        },
        None => {
            // Model forgot to ask; turn the last kept sentence into a question
            let mut out = sentences.into_iter().take(2).collect::<Vec<_>>().join(" ");
            while out.ends_with('.') || out.ends_with('!') {
                out.pop();
            }
            out.push('?');
            out
        },
    }
}

/// Remove markdown decoration and collapse whitespace
fn strip_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for line in raw.lines() {
        let line = line
            .trim_start()
            .trim_start_matches(|c| c == '-' || c == '*' || c == '#' || c == '>')
            .trim();
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&line.replace(['*', '#', '`'], ""));
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split into sentences, keeping terminators
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '?' | '!') {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}
