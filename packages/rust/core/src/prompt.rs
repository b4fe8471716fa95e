//! Prompt construction for persona generation.

use crate::text;

/// Default character budget for the joined user content.
pub const DEFAULT_MAX_CHARS: usize = 2000;

/// Builds the persona prompt from a subject's posts and comments.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl PromptBuilder {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Render the prompt. Content beyond the character budget is dropped so
    /// small-context models are not overrun.
    pub fn persona_prompt(&self, username: &str, posts: &[String], comments: &[String]) -> String {
        let all: Vec<&String> = posts.iter().chain(comments.iter()).collect();
        let joined = text::safe_join(&all, "\n");
        let content = text::truncate_text(&joined, self.max_chars);

        format!(
            "Based on the following Reddit posts and comments from user `{username}`, \
             create a detailed user persona.\n\
             Include: Name, Age, Occupation, Location, Traits, Behaviours, Motivations, \
             Frustrations, and Goals.\n\
             For each attribute, cite the post or comment it was inferred from. \
             If an attribute cannot be inferred, say \"Not specified\".\n\
             Structure the output clearly.\n\n\
             --- CONTENT START ---\n\
             {content}\n\
             --- CONTENT END ---\n"
        )
    }
}
