//! System prompts for LLM keyword annotation.
//!
//! Kept in one place so the wording can be inspected by tests and changed
//! without touching the annotation loop. Callers can override the prompt via
//! [`crate::config::AnnotationConfig::system_prompt`].

/// Default keyword count requested from the model.
pub const DEFAULT_KEYWORD_COUNT: usize = 15;

/// Build the default system prompt asking for `count` keywords.
///
/// The reply format (`*keyword*` spans) is what
/// [`crate::pipeline::annotate::parse_keywords`] reads back.
pub fn keyword_system_prompt(count: usize) -> String {
    format!(
        "Extract exactly {count} of the most important keywords from the text you are given.\n\
         Rules:\n\
         - Each keyword must be a single word.\n\
         - Do not join words with hyphens, commas or any other character.\n\
         - Do not repeat a keyword within the set of {count}.\n\
         - Every keyword must be relevant and meaningful in the context of the text.\n\
         - Keep the language of the text (a Spanish paragraph gets Spanish keywords).\n\
         - Wrap each keyword in asterisks, for example: *migration*, *rights*, *discrimination*.\n\
         Output only the keywords."
    )
}
