//! Command parsing: prefix detection, command token, and arguments.

/// Result of parsing a message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub is_command: bool,
    /// Lower-cased first token after the prefix. Empty when not a command.
    pub command: String,
    /// Whitespace-split tokens after the command.
    pub args: Vec<String>,
    /// Everything after the first whitespace, verbatim (trimmed), for
    /// free-form arguments such as URLs or prose.
    pub text: String,
}

/// Parse `body` against `prefix`.
pub fn parse(body: &str, prefix: &str) -> ParsedCommand {
    if prefix.is_empty() {
        return ParsedCommand::default();
    }
    let Some(rest) = body.strip_prefix(prefix) else {
        return ParsedCommand::default();
    };

    let mut tokens = rest.split_whitespace();
    let command = tokens.next().unwrap_or_default().to_lowercase();
    let args = tokens.map(str::to_string).collect();

    // Free text starts after the first whitespace run following the token.
    let text = rest
        .trim_start()
        .split_once(char::is_whitespace)
        .map(|(_, tail)| tail.trim().to_string())
        .unwrap_or_default();

    ParsedCommand {
        is_command: true,
        command,
        args,
        text,
    }
}
