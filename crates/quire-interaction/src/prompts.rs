//! Prompt text sent to the generation model.
//!
//! Both prompts ask for the same JSON reply, `{"latexCode", "chatMessage"}`,
//! which [`parse_reply`] turns into a [`GeneratedDocument`].

use quire_core::conversation::{ConversationTurn, render_transcript};
use quire_core::error::{QuireError, Result};
use quire_core::generation::GeneratedDocument;
use serde::Deserialize;

const REPLY_FORMAT: &str = r#"Reply with a single JSON object and nothing else:
{"latexCode": "<the complete LaTeX document>", "chatMessage": "<one or two sentences for the author about what you did>"}
The LaTeX must be a complete document that compiles with pdflatex without errors."#;

pub const DEFAULT_CHAT_MESSAGE: &str = "Here is the updated document.";

pub fn initial_prompt(instruction: &str) -> String {
    format!(
        "You are a LaTeX expert. Generate LaTeX code for a book based on the following prompt.\n\n\
         Prompt: {instruction}\n\n\
         {REPLY_FORMAT}"
    )
}

pub fn refine_prompt(body: &str, history: &[ConversationTurn], instruction: &str) -> String {
    format!(
        "You are an AI assistant specialized in refining LaTeX content. A user is creating a book \
         and refines its LaTeX content iteratively based on their feedback.\n\n\
         Here is the current LaTeX content:\n\n{body}\n\n\
         Here is the chat history:\n{transcript}\n\n\
         Based on the chat history and the following prompt, refine the LaTeX content.\n\
         Prompt: {instruction}\n\n\
         {REPLY_FORMAT}",
        transcript = render_transcript(history),
    )
}

#[derive(Deserialize)]
struct Reply {
    #[serde(rename = "latexCode", alias = "refinedLatexContent", alias = "latex")]
    latex_code: String,
    #[serde(rename = "chatMessage", default)]
    chat_message: Option<String>,
}

/// Extracts the document from the model's reply.
///
/// Accepts the JSON reply, optionally wrapped in a Markdown code fence. A
/// reply that is plain LaTeX is taken as the body as-is.
///
/// # Errors
///
/// Returns `QuireError::Generation` when the reply holds no LaTeX.
pub fn parse_reply(text: &str) -> Result<GeneratedDocument> {
    let unfenced = strip_code_fence(text);

    if let Ok(reply) = serde_json::from_str::<Reply>(unfenced) {
        let body = reply.latex_code.trim().to_string();
        if body.is_empty() {
            return Err(QuireError::generation("Model returned an empty document"));
        }
        let explanation = reply
            .chat_message
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_MESSAGE.to_string());
        return Ok(GeneratedDocument { body, explanation });
    }

    if unfenced.contains("\\documentclass") || unfenced.contains("\\begin{") {
        tracing::debug!("Model reply was not JSON, using it as raw LaTeX");
        return Ok(GeneratedDocument {
            body: unfenced.to_string(),
            explanation: DEFAULT_CHAT_MESSAGE.to_string(),
        });
    }

    Err(QuireError::generation(
        "Model response did not contain a LaTeX document",
    ))
}

/// Strips a surrounding ```` ```lang ... ``` ```` fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "latex", ...) on the opening line
    match inner.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refine_prompt_carries_body_history_and_instruction() {
        let history = vec![
            ConversationTurn::user("Write a book about tides"),
            ConversationTurn::assistant("Done."),
            ConversationTurn::user("Add a chapter"),
        ];

        let prompt = refine_prompt("\\section{Tides}", &history, "Add a chapter");

        assert!(prompt.contains("\\section{Tides}"));
        assert!(prompt.contains("User: Write a book about tides\nAssistant: Done.\nUser: Add a chapter"));
        assert!(prompt.contains("Prompt: Add a chapter"));
        assert!(prompt.contains("latexCode"));
    }

    #[test]
    fn test_parse_plain_json() {
        let reply = parse_reply(r#"{"latexCode": "\\documentclass{book}", "chatMessage": "Drafted."}"#)
            .unwrap();
        assert_eq!(reply.body, "\\documentclass{book}");
        assert_eq!(reply.explanation, "Drafted.");
    }

    #[test]
    fn test_parse_fenced_json_without_message() {
        let text = "```json\n{\"refinedLatexContent\": \"\\\\begin{document}x\\\\end{document}\"}\n```";
        let reply = parse_reply(text).unwrap();
        assert_eq!(reply.body, "\\begin{document}x\\end{document}");
        assert_eq!(reply.explanation, DEFAULT_CHAT_MESSAGE);
    }

    #[test]
    fn test_parse_raw_latex() {
        let reply = parse_reply("```latex\n\\documentclass{article}\n\\begin{document}Hi\\end{document}\n```")
            .unwrap();
        assert!(reply.body.starts_with("\\documentclass{article}"));
    }

    #[test]
    fn test_reject_prose_and_empty_documents() {
        assert!(parse_reply("Sorry, I cannot help with that.").unwrap_err().is_generation());
        assert!(parse_reply(r#"{"latexCode": "  "}"#).is_err());
    }
}
