//! Quote-aware splitting of compound shell commands.
//!
//! [`split`] breaks a raw command line into atomic commands at the
//! unquoted control operators `&&`, `||`, `|`, `;` and newline. It is not a
//! shell parser: there is no expansion, no subshell handling and no
//! redirection semantics.
//!
//! Quoting rules:
//! - Inside single quotes nothing is special, not even backslash.
//! - Inside double quotes operators are inert; a backslash keeps the next
//!   character from closing the quote.
//! - Outside quotes a backslash escapes exactly the next character.
//!
//! Escapes and quotes are preserved verbatim in the output. An unterminated
//! quote swallows the rest of the input into the open quote; the condition
//! is reported through [`SplitOutcome::unterminated_quote`] rather than as
//! an error.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// The result of splitting a compound command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitOutcome {
    /// Trimmed, non-empty atomic commands in input order.
    pub commands: Vec<String>,
    /// Byte range of each command within the input, parallel to `commands`.
    pub spans: Vec<Range<usize>>,
    /// Whether the input ended inside a quote.
    pub unterminated_quote: bool,
}

impl SplitOutcome {
    fn push_segment(&mut self, raw: &str, start: usize, end: usize) {
        let segment = raw.get(start..end).unwrap_or_default();
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            return;
        }
        let from = start.saturating_add(segment.len().saturating_sub(segment.trim_start().len()));
        self.commands.push(trimmed.to_owned());
        self.spans.push(from..from.saturating_add(trimmed.len()));
    }
}

/// Split a raw command line into atomic commands.
///
/// Whitespace-only input yields an empty vector.
///
/// # Example
///
/// ```
/// use opsguard_policy::split::split;
///
/// assert_eq!(
///     split("kubectl get pods && terraform apply"),
///     vec!["kubectl get pods", "terraform apply"]
/// );
/// assert_eq!(split("echo 'a|b'"), vec!["echo 'a|b'"]);
/// ```
#[must_use]
pub fn split(raw: &str) -> Vec<String> {
    split_detailed(raw).commands
}

/// Split a raw command line, also reporting where each command sits and
/// whether a quote was left open.
#[must_use]
pub fn split_detailed(raw: &str) -> SplitOutcome {
    let mut outcome = SplitOutcome::default();
    let mut start = 0usize;
    let mut quote = Quote::None;
    let mut chars = raw.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                }
            },
            Quote::Double => {
                if c == '\\' {
                    chars.next();
                } else if c == '"' {
                    quote = Quote::None;
                }
            },
            Quote::None => match c {
                '\\' => {
                    chars.next();
                },
                '\'' => quote = Quote::Single,
                '"' => quote = Quote::Double,
                '&' if chars.peek().is_some_and(|&(_, next)| next == '&') => {
                    chars.next();
                    outcome.push_segment(raw, start, idx);
                    start = idx.saturating_add(2);
                },
                '|' => {
                    let mut width = 1usize;
                    if chars.peek().is_some_and(|&(_, next)| next == '|') {
                        chars.next();
                        width = 2;
                    }
                    outcome.push_segment(raw, start, idx);
                    start = idx.saturating_add(width);
                },
                ';' | '\n' => {
                    outcome.push_segment(raw, start, idx);
                    start = idx.saturating_add(1);
                },
                _ => {},
            },
        }
    }
    outcome.push_segment(raw, start, raw.len());
    outcome.unterminated_quote = quote != Quote::None;
    outcome
}
