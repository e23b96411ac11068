//! Prompt rendering
//!
//! The template asks for a `Language:` header followed by five `T:`/`E:`/`P:`
//! blocks. [`crate::parser`] consumes exactly that shape, so the two must be
//! changed together.

use crate::config::DEFAULT_MAX_NEW_TOKENS;
use crate::model::ModelRequest;
use crate::validator::ValidatedWord;

/// Renders validated words into model requests
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    max_new_tokens: u32,
}

impl PromptBuilder {
    pub fn new(max_new_tokens: u32) -> Self {
        Self { max_new_tokens }
    }

    /// Render the instruction text for a word
    pub fn build_prompt(&self, word: &ValidatedWord) -> String {
        format!(
            "What language is '{word}'? First line of your response should be 'Language: (language name in English)'.\n\n\
             Then generate five example sentences for this word.\n\
             Each sentence must show different usages.\n\
             Format each example as:\n\
             T: (Target language sentence)\n\
             E: (English translation)\n\
             P: (Pronunciation guide)\n\
             Separate each entry with a blank line.\n\
             Do not include extra text or explanations.",
            word = word.as_str(),
        )
    }

    /// Build the full request payload for a word
    pub fn build_request(&self, word: &ValidatedWord) -> ModelRequest {
        ModelRequest::user_text(self.build_prompt(word), self.max_new_tokens)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NEW_TOKENS)
    }
}
