//! REPL input parsing.

use std::path::PathBuf;

/// Slash commands offered for completion.
pub const COMMANDS: &[&str] = &[
    "/auto",
    "/delete",
    "/edit",
    "/export",
    "/help",
    "/history",
    "/list",
    "/open",
    "/regenerate",
    "/show",
    "/source",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: an instruction for the session
    Submit(String),
    /// Load the document body from a file, as an editor change
    Edit(PathBuf),
    Regenerate,
    AutoCompile(bool),
    Show,
    /// Print the body, or write it to a file
    Source(Option<PathBuf>),
    History,
    List,
    Open(String),
    Delete(String),
    /// Write the last rendered PDF to a file
    Export(PathBuf),
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line == "quit" || line == "exit" {
            return Some(Command::Quit);
        }
        if !line.starts_with('/') {
            return Some(Command::Submit(line.to_string()));
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        let command = match (name, arg) {
            ("/edit", "") => Command::Invalid("usage: /edit <file>".to_string()),
            ("/edit", path) => Command::Edit(PathBuf::from(path)),
            ("/regenerate", _) => Command::Regenerate,
            ("/auto", "on") => Command::AutoCompile(true),
            ("/auto", "off") => Command::AutoCompile(false),
            ("/auto", _) => Command::Invalid("usage: /auto on|off".to_string()),
            ("/show", _) => Command::Show,
            ("/source", "") => Command::Source(None),
            ("/source", path) => Command::Source(Some(PathBuf::from(path))),
            ("/history", _) => Command::History,
            ("/list", _) => Command::List,
            ("/open", "") => Command::Invalid("usage: /open <id>".to_string()),
            ("/open", id) => Command::Open(id.to_string()),
            ("/delete", "") => Command::Invalid("usage: /delete <id>".to_string()),
            ("/delete", id) => Command::Delete(id.to_string()),
            ("/export", "") => Command::Invalid("usage: /export <file.pdf>".to_string()),
            ("/export", path) => Command::Export(PathBuf::from(path)),
            ("/help", _) => Command::Help,
            (other, _) => Command::Invalid(format!("Unknown command: {other}")),
        };
        Some(command)
    }
}
