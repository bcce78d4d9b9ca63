use std::fmt::Write as _;

use crate::content::GeneratedContent;

const GENERATION_PROMPT: &str = "\
Analyze this video and write content for a social media post about it.
The content should be engaging, relevant to what happens in the video, and suited to short-form platforms.

Reply in JSON with these fields:
1. \"title\": a short, catchy title (at most 15 words).
2. \"caption\": a descriptive, engaging caption (2 to 4 sentences).
3. \"hashtags\": an array of 5 to 10 relevant, popular hashtags as strings, without the '#' symbol.";

const REFINEMENT_PROMPT: &str = "\
You previously wrote the social media content below for this video.
Rewrite it following the user's instruction. Watch the video again so the result stays accurate,
and keep every field the instruction does not ask to change close to the original.

Reply in JSON with the same fields: \"title\" (at most 15 words), \"caption\" (2 to 4 sentences)
and \"hashtags\" (5 to 10 strings without the '#' symbol).";

/// Prompt for a first generation; `context` is appended verbatim when not blank.
pub(crate) fn generation_prompt(context: Option<&str>) -> String {
    match context.filter(|c| !c.trim().is_empty()) {
        Some(context) => format!("{GENERATION_PROMPT}\n\nAdditional context from the user:\n{context}"),
        None => GENERATION_PROMPT.to_string(),
    }
}

/// One refine call's inputs.
#[derive(Debug, Clone, Copy)]
pub struct RefinementRequest<'a> {
    pub prior: &'a GeneratedContent,
    pub instruction: &'a str,
}

impl RefinementRequest<'_> {
    /// Restates the prior content verbatim, then the instruction.
    pub(crate) fn prompt(&self) -> String {
        let mut prompt = String::from(REFINEMENT_PROMPT);
        // Writing to a String cannot fail.
        let _ = write!(
            prompt,
            "\n\nCurrent title:\n{}\n\nCurrent caption:\n{}\n\nCurrent hashtags:\n{}\n\nInstruction:\n{}",
            self.prior.title,
            self.prior.caption,
            self.prior.hashtags.join(", "),
            self.instruction.trim(),
        );
        prompt
    }
}
