//! Interactive shell syntax diagnostics
//!
//! Playgrounds run as scripts, so the interactive-only shell commands are
//! invalid there:
//! - show dbs, show collections, show users, etc.
//! - use <database>
//! - it, exit, quit
//!
//! These commands don't use script syntax, so they are found by simple
//! string matching, one line at a time. Where a script equivalent exists the
//! diagnostic carries it as a fix.

use serde::Serialize;
use tracing::debug;

use crate::config::DiagnosticsConfig;
use crate::parser::{Position, SourceRange};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

/// Stable diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// A shell command that only works in the interactive shell
    InvalidInteractiveSyntax,
}

/// One finding, in editor coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub range: SourceRange,
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Replacement text for `range`, if a script equivalent exists
    pub fix: Option<String>,
}

/// Diagnostics for a document, honouring the configuration
pub fn diagnostics(text: &str, config: &DiagnosticsConfig) -> Vec<Diagnostic> {
    if !config.enabled {
        return Vec::new();
    }
    check_interactive_syntax(text)
}

/// Find interactive shell commands in a document
pub fn check_interactive_syntax(text: &str) -> Vec<Diagnostic> {
    let mut found = Vec::new();
    let mut in_block_comment = false;

    for (line_number, line) in text.split('\n').enumerate() {
        let starts_in_comment = in_block_comment;
        in_block_comment = block_comment_open_after(line, in_block_comment);
        if starts_in_comment {
            continue;
        }

        let trimmed = line.trim();
        let command = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
        let Some(fix) = interactive_command(command) else {
            continue;
        };

        let start = line.chars().take_while(|c| c.is_whitespace()).count();
        let end = start + trimmed.chars().count();
        let message = match &fix {
            Some(replacement) => format!(
                "'{command}' is only valid in the interactive shell; use '{replacement}' in playgrounds"
            ),
            None => format!("'{command}' is only valid in the interactive shell"),
        };

        found.push(Diagnostic {
            range: SourceRange {
                start: Position::new(line_number, start),
                end: Position::new(line_number, end),
            },
            severity: Severity::Error,
            code: DiagnosticCode::InvalidInteractiveSyntax,
            message,
            fix,
        });
    }

    debug!("Found {} interactive syntax diagnostic(s)", found.len());
    found
}

/// Classify a line as an interactive command
///
/// # Returns
/// * `None` - Not an interactive command
/// * `Some(None)` - Interactive command without script equivalent
/// * `Some(Some(fix))` - Interactive command and its replacement
fn interactive_command(command: &str) -> Option<Option<String>> {
    if matches!(command, "it" | "exit" | "quit") {
        return Some(None);
    }

    if let Some(rest) = command.strip_prefix("show ") {
        return match rest.trim() {
            "dbs" | "databases" => Some(Some("db.getMongo().getDBs();".to_string())),
            "collections" | "tables" => Some(Some("db.getCollectionNames();".to_string())),
            "users" | "roles" | "profile" | "logs" => Some(None),
            other if other.starts_with("log ") => Some(None),
            _ => None,
        };
    }

    if let Some(rest) = command.strip_prefix("use ") {
        let db_name = rest.trim();
        if is_valid_db_name(db_name) {
            return Some(Some(format!("use('{db_name}');")));
        }
    }

    None
}

/// Validate database name
fn is_valid_db_name(name: &str) -> bool {
    // MongoDB database name restrictions:
    // - Cannot be empty
    // - Cannot contain /\. "$*<>:|?
    // - Cannot be longer than 64 characters
    if name.is_empty() || name.len() > 64 {
        return false;
    }

    !name.chars().any(|ch| {
        matches!(
            ch,
            '/' | '\\' | '.' | ' ' | '"' | '\'' | '$' | '*' | '<' | '>' | ':' | '|' | '?' | '('
                | ')' | '\0'
        )
    })
}

/// Whether a block comment is still open at the end of `line`
fn block_comment_open_after(line: &str, mut open: bool) -> bool {
    let mut rest = line;
    loop {
        if open {
            match rest.find("*/") {
                Some(end) => {
                    open = false;
                    rest = &rest[end + 2..];
                }
                None => return true,
            }
        } else {
            match (rest.find("/*"), rest.find("//")) {
                (Some(start), Some(line_comment)) if line_comment < start => return false,
                (Some(start), _) => {
                    open = true;
                    rest = &rest[start + 2..];
                }
                (None, _) => return false,
            }
        }
    }
}
