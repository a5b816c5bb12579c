use crate::config::Language;

/// Everything one prompt is built from
#[derive(Debug, Clone)]
pub struct TranslationRequest<'a> {
    pub content: &'a str,
    pub target_language: Language,
}

/// Build the numbered-lines translation prompt.
///
/// The embedded example anchors the `N. text` shape the response parser expects.
pub fn build_prompt(request: &TranslationRequest<'_>) -> String {
    format!(
        "Translate the following numbered subtitle lines into {}.\n\
         \n\
         Return only the translations, keeping the same numbering format.\n\
         Do not include any extra comments, summaries, headers, or explanations.\n\
         \n\
         Example format:\n\
         1. Hello!\n\
         2. How are you?\n\
         \n\
         Content:\n\
         {}",
        request.target_language, request.content
    )
}
