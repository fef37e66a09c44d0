//! Commit-message hygiene for `git commit`.

use regex::Regex;
use std::sync::LazyLock;

use super::{CheckOutcome, CheckStage, CommandCheck, Rejection};
use crate::command::{ParsedCommand, join};

static CONVENTIONAL_SUBJECT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:feat|fix|docs|style|refactor|perf|test|build|ci|chore|revert)(?:\([\w./-]+\))?!?: \S",
    )
    .ok()
});

/// Strips forbidden trailer lines from `git commit` messages and optionally
/// enforces Conventional Commit subjects.
///
/// Trailers are removed rather than rejected: the corrected command is
/// returned as a rewrite. A message that is empty once trailers are gone
/// is rejected.
#[derive(Debug, Clone)]
pub struct CommitMessageCheck {
    forbidden_prefixes: Vec<String>,
    require_conventional: bool,
}

impl CommitMessageCheck {
    /// Create a check stripping lines that start with any of `trailers`
    /// (compared case-insensitively).
    #[must_use]
    pub fn new(trailers: &[String], require_conventional: bool) -> Self {
        Self {
            forbidden_prefixes: trailers
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            require_conventional,
        }
    }

    fn is_forbidden(&self, line: &str) -> bool {
        let line = line.trim_start().to_lowercase();
        self.forbidden_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Remove forbidden lines; `None` when nothing changed.
    fn clean(&self, message: &str) -> Option<String> {
        if !message.lines().any(|l| self.is_forbidden(l)) {
            return None;
        }
        let kept: Vec<&str> = message.lines().filter(|l| !self.is_forbidden(l)).collect();
        Some(kept.join("\n").trim_end().to_owned())
    }
}

fn is_commit(cmd: &ParsedCommand) -> bool {
    cmd.program() == "git" && cmd.positionals().take(2).any(|w| w == "commit")
}

/// Short options of `git commit` that take no value and may precede `m` in
/// a cluster such as `-am`.
const BOOLEAN_SHORT_FLAGS: &str = "aeinopqsv";

/// A message-bearing argument of `git commit`.
enum MessageArg<'a> {
    /// `-m msg`, `--message msg` or a cluster ending in `m` (`-am msg`).
    /// `flags` are the cluster's other letters, kept if the message goes.
    Separate { flags: &'a str },
    /// `-mmsg`, `-ammsg` or `--message=msg`, with the prefix length.
    Attached { flags: &'a str, prefix_len: usize },
    /// `--trailer value`.
    TrailerSeparate,
    /// `--trailer=value`.
    TrailerAttached,
}

fn classify_arg(arg: &str) -> Option<MessageArg<'_>> {
    match arg {
        "--message" => return Some(MessageArg::Separate { flags: "" }),
        "--trailer" => return Some(MessageArg::TrailerSeparate),
        _ if arg.starts_with("--message=") => {
            return Some(MessageArg::Attached {
                flags: "",
                prefix_len: "--message=".len(),
            });
        },
        _ if arg.starts_with("--trailer=") => return Some(MessageArg::TrailerAttached),
        _ => {},
    }
    let body = arg.strip_prefix('-').filter(|b| !b.starts_with('-'))?;
    let at = body.find('m')?;
    let flags = body.get(..at)?;
    if !flags.chars().all(|c| BOOLEAN_SHORT_FLAGS.contains(c)) {
        return None;
    }
    let prefix_len = at.saturating_add(2);
    if prefix_len == arg.len() {
        Some(MessageArg::Separate { flags })
    } else {
        Some(MessageArg::Attached { flags, prefix_len })
    }
}

/// What remains of a cluster such as `-am` once its message is dropped.
fn keep_flags(out: &mut Vec<String>, flags: &str) {
    if !flags.is_empty() {
        out.push(format!("-{flags}"));
    }
}

impl CommandCheck for CommitMessageCheck {
    fn name(&self) -> &'static str {
        "commit_message"
    }

    fn stage(&self) -> CheckStage {
        CheckStage::Format
    }

    fn check(&self, cmd: &ParsedCommand) -> CheckOutcome {
        if !is_commit(cmd) {
            return CheckOutcome::Pass;
        }

        let words = cmd.words();
        let mut out: Vec<String> = Vec::with_capacity(words.len());
        let mut messages: Vec<String> = Vec::new();
        let mut had_message = false;
        let mut changed = false;
        let mut idx = 0usize;

        while let Some(word) = words.get(idx) {
            let next = idx.saturating_add(1);
            match classify_arg(word) {
                Some(MessageArg::Separate { flags }) => {
                    let Some(value) = words.get(next) else {
                        out.push(word.clone());
                        idx = next;
                        continue;
                    };
                    had_message = true;
                    match self.clean(value) {
                        Some(cleaned) if cleaned.is_empty() => {
                            changed = true;
                            keep_flags(&mut out, flags);
                        },
                        Some(cleaned) => {
                            changed = true;
                            out.push(word.clone());
                            out.push(cleaned.clone());
                            messages.push(cleaned);
                        },
                        None => {
                            out.push(word.clone());
                            out.push(value.clone());
                            messages.push(value.clone());
                        },
                    }
                    idx = next.saturating_add(1);
                    continue;
                },
                Some(MessageArg::Attached { flags, prefix_len }) => {
                    had_message = true;
                    let (flag, value) = word.split_at(prefix_len);
                    match self.clean(value) {
                        Some(cleaned) if cleaned.is_empty() => {
                            changed = true;
                            keep_flags(&mut out, flags);
                        },
                        Some(cleaned) => {
                            changed = true;
                            out.push(format!("{flag}{cleaned}"));
                            messages.push(cleaned);
                        },
                        None => {
                            out.push(word.clone());
                            messages.push(value.to_owned());
                        },
                    }
                },
                Some(MessageArg::TrailerSeparate) => {
                    if let Some(value) = words.get(next) {
                        if self.is_forbidden(value) {
                            changed = true;
                        } else {
                            out.push(word.clone());
                            out.push(value.clone());
                        }
                        idx = next.saturating_add(1);
                        continue;
                    }
                    out.push(word.clone());
                },
                Some(MessageArg::TrailerAttached) => {
                    let value = word.trim_start_matches("--trailer=");
                    if self.is_forbidden(value) {
                        changed = true;
                    } else {
                        out.push(word.clone());
                    }
                },
                None => out.push(word.clone()),
            }
            idx = next;
        }

        if had_message && messages.is_empty() {
            return CheckOutcome::Reject(Rejection {
                reason: "commit message is empty once forbidden trailers are removed".to_owned(),
                category: "commit".to_owned(),
                suggestions: vec!["Write a descriptive commit message without attribution trailers".to_owned()],
            });
        }

        if self.require_conventional
            && let Some(subject) = messages.first().and_then(|m| m.lines().next())
            && !CONVENTIONAL_SUBJECT
                .as_ref()
                .is_some_and(|re| re.is_match(subject))
        {
            return CheckOutcome::Reject(Rejection {
                reason: format!("commit subject {subject:?} is not a Conventional Commit"),
                category: "commit".to_owned(),
                suggestions: vec![
                    "Use a subject such as `fix(api): handle empty payload`".to_owned(),
                ],
            });
        }

        if changed {
            CheckOutcome::Rewrite {
                command: join(&out),
                reason: "removed forbidden commit trailer lines".to_owned(),
            }
        } else {
            CheckOutcome::Pass
        }
    }
}
