//! Tokenized view of a single atomic command.
//!
//! [`ParsedCommand`] resolves quoting into plain words, skips leading
//! environment assignments and transparent wrappers (`sudo`, `timeout`,
//! `xargs`, ...), and exposes the program name, its arguments and a
//! normalized single-line form that the pattern tables match against.

/// A launcher that runs the words after its own options as the real command.
struct Wrapper {
    name: &'static str,
    /// Options that consume the following word (`sudo -u root`).
    value_flags: &'static [&'static str],
    /// Operands between the options and the command (`timeout 60`).
    operands: usize,
}

const WRAPPERS: &[Wrapper] = &[
    Wrapper {
        name: "sudo",
        value_flags: &["-u", "-g", "-p", "-C", "-U", "-r", "-t", "-D"],
        operands: 0,
    },
    Wrapper {
        name: "env",
        value_flags: &["-u", "-C", "--unset", "--chdir"],
        operands: 0,
    },
    Wrapper {
        name: "time",
        value_flags: &["-f", "-o", "--format", "--output"],
        operands: 0,
    },
    Wrapper {
        name: "nohup",
        value_flags: &[],
        operands: 0,
    },
    Wrapper {
        name: "command",
        value_flags: &[],
        operands: 0,
    },
    Wrapper {
        name: "exec",
        value_flags: &["-a"],
        operands: 0,
    },
    Wrapper {
        name: "nice",
        value_flags: &["-n", "--adjustment"],
        operands: 0,
    },
    Wrapper {
        name: "ionice",
        value_flags: &["-c", "-n", "-p", "--class", "--classdata"],
        operands: 0,
    },
    Wrapper {
        name: "timeout",
        value_flags: &["-s", "-k", "--signal", "--kill-after"],
        operands: 1,
    },
    Wrapper {
        name: "xargs",
        value_flags: &[
            "-a", "-d", "-E", "-I", "-L", "-n", "-P", "-s", "--arg-file", "--delimiter",
            "--max-args", "--max-lines", "--max-procs", "--max-chars",
        ],
        operands: 0,
    },
    Wrapper {
        name: "watch",
        value_flags: &["-n", "--interval", "-q", "--equexit"],
        operands: 0,
    },
    Wrapper {
        name: "stdbuf",
        value_flags: &["-i", "-o", "-e"],
        operands: 0,
    },
];

/// Shells whose `-c` argument is itself a command line.
const SHELLS: &[&str] = &["sh", "bash", "zsh", "dash", "ksh"];

/// Shell options that consume the following word.
const SHELL_VALUE_OPTIONS: &[&str] = &["-o", "+o", "-O", "+O", "--rcfile", "--init-file"];

/// Flags that turn a mutating invocation into a simulation.
const DRY_RUN_FLAGS: &[&str] = &[
    "--dry-run",
    "--dryrun",
    "--server-dry-run",
    "--simulate",
    "--what-if",
    "--validate-only",
];

/// A tokenized atomic command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    raw: String,
    words: Vec<String>,
    program_index: Option<usize>,
    program: String,
    normalized: String,
}

impl ParsedCommand {
    /// Tokenize an atomic command.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let words = words(raw);
        let program_index = find_program(&words);
        let program = program_index
            .and_then(|idx| words.get(idx))
            .map(|w| basename(w).to_ascii_lowercase())
            .unwrap_or_default();

        let mut normalized = program.clone();
        if let Some(idx) = program_index {
            for word in words.iter().skip(idx.saturating_add(1)) {
                normalized.push(' ');
                if word.chars().any(char::is_whitespace) {
                    normalized.push('"');
                    normalized.push_str(&word.to_lowercase());
                    normalized.push('"');
                } else {
                    normalized.push_str(&word.to_lowercase());
                }
            }
        }

        Self {
            raw: raw.trim().to_owned(),
            words,
            program_index,
            program,
            normalized,
        }
    }

    /// The command as written, trimmed.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lower-cased basename of the program (`/usr/bin/kubectl` becomes `kubectl`).
    ///
    /// Empty when the command has no program word.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Every word of the command, including leading assignments and wrappers.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Arguments after the program, with quoting resolved.
    #[must_use]
    pub fn args(&self) -> &[String] {
        match self.program_index {
            Some(idx) => self.words.get(idx.saturating_add(1)..).unwrap_or_default(),
            None => &[],
        }
    }

    /// Lower-cased `program arg arg ...` form used for pattern matching.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Arguments that are not flags, in order.
    pub fn positionals(&self) -> impl Iterator<Item = &str> {
        self.args()
            .iter()
            .map(String::as_str)
            .filter(|a| !a.starts_with('-'))
    }

    /// Whether `flag` is present among the arguments.
    ///
    /// Understands `--long=value`, attached short values (`-i.bak`) and
    /// short-flag clusters (`-fd` contains `-f`).
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args().iter().any(|arg| flag_matches(arg, flag))
    }

    /// Whether any of `flags` is present.
    #[must_use]
    pub fn has_any_flag(&self, flags: &[&str]) -> bool {
        flags.iter().any(|flag| self.has_flag(flag))
    }

    /// The first of `flags` that is present.
    #[must_use]
    pub fn first_flag<'f>(&self, flags: &[&'f str]) -> Option<&'f str> {
        flags.iter().copied().find(|flag| self.has_flag(flag))
    }

    /// Whether the command carries an explicit dry-run or validate-only flag.
    ///
    /// `--dry-run=none` and `--dry-run=false` do not count.
    #[must_use]
    pub fn has_dry_run_flag(&self) -> bool {
        self.args()
            .iter()
            .take_while(|arg| *arg != "--")
            .any(|arg| is_dry_run_flag(arg))
    }

    /// The command line a shell is asked to run (`bash -c '...'`).
    ///
    /// Recognizes `-c` on its own and inside a short-flag cluster (`-lc`).
    #[must_use]
    pub fn shell_script(&self) -> Option<&str> {
        if !SHELLS.contains(&self.program.as_str()) {
            return None;
        }
        let mut args = self.args().iter();
        while let Some(arg) = args.next() {
            if SHELL_VALUE_OPTIONS.contains(&arg.as_str()) {
                args.next();
                continue;
            }
            if arg.starts_with("--") || arg.starts_with('+') {
                continue;
            }
            let Some(body) = arg.strip_prefix('-') else {
                // A script file or the first operand; `-c` can no longer follow.
                return None;
            };
            if body.contains('c') {
                return args.next().map(String::as_str);
            }
        }
        None
    }
}

fn is_dry_run_flag(arg: &str) -> bool {
    let lower = arg.to_ascii_lowercase();
    DRY_RUN_FLAGS.iter().any(|flag| {
        if lower == *flag {
            return true;
        }
        lower
            .strip_prefix(flag)
            .and_then(|rest| rest.strip_prefix('='))
            .is_some_and(|value| !matches!(value, "none" | "false" | "0"))
    })
}

pub(crate) fn flag_matches(arg: &str, flag: &str) -> bool {
    if arg == flag {
        return true;
    }
    if flag.starts_with("--") || !flag.starts_with('-') {
        return arg
            .strip_prefix(flag)
            .is_some_and(|rest| rest.starts_with('='));
    }
    if arg.starts_with("--") || !arg.starts_with('-') {
        return false;
    }
    let mut flag_chars = flag.chars().skip(1);
    let (Some(letter), None) = (flag_chars.next(), flag_chars.next()) else {
        // Single-dash long options (`-delete`, `-exec`) only match exactly.
        return arg
            .strip_prefix(flag)
            .is_some_and(|rest| rest.starts_with('='));
    };
    let body = &arg[1..];
    if body.chars().all(|c| c.is_ascii_alphabetic()) && body.len() <= 4 {
        // Short-flag cluster such as `-fd` or `-ni`.
        return body.contains(letter);
    }
    // Attached value such as `-i.bak` or `-n10`.
    let mut body_chars = body.chars();
    body_chars.next() == Some(letter) && body_chars.next().is_some_and(|c| !c.is_ascii_alphabetic())
}

/// Split an atomic command into words, resolving quotes and escapes.
///
/// An unterminated quote extends to the end of the input.
#[must_use]
pub fn words(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = raw.chars();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                } else {
                    current.push(c);
                }
            },
            Some(_) => match c {
                '"' => quote = None,
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                },
                _ => current.push(c),
            },
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_word = true;
                },
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                    in_word = true;
                },
                c if c.is_whitespace() => {
                    if in_word {
                        out.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                },
                _ => {
                    current.push(c);
                    in_word = true;
                },
            },
        }
    }
    if in_word {
        out.push(current);
    }
    out
}

/// Quote a word for a POSIX shell, leaving plain words untouched.
#[must_use]
pub fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if plain {
        word.to_owned()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Join words into a command line, quoting where needed.
#[must_use]
pub fn join<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| quote(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_program(words: &[String]) -> Option<usize> {
    let mut idx = 0usize;
    while let Some(word) = words.get(idx) {
        if is_env_assignment(word) {
            idx = idx.saturating_add(1);
            continue;
        }
        let name = basename(word);
        if let Some(wrapper) = WRAPPERS.iter().find(|w| w.name == name) {
            idx = wrapper.skip_prefix(words, idx.saturating_add(1));
            continue;
        }
        return Some(idx);
    }
    None
}

impl Wrapper {
    /// Index of the first word after this wrapper's options and operands.
    fn skip_prefix(&self, words: &[String], mut idx: usize) -> usize {
        let mut operands = self.operands;
        let mut options_done = false;
        while let Some(word) = words.get(idx) {
            if !options_done && word == "--" {
                options_done = true;
                idx = idx.saturating_add(1);
            } else if !options_done && word.len() > 1 && word.starts_with('-') {
                idx = idx.saturating_add(1);
                if self.value_flags.contains(&word.as_str()) {
                    idx = idx.saturating_add(1);
                }
            } else if operands > 0 {
                operands = operands.saturating_sub(1);
                idx = idx.saturating_add(1);
            } else if is_env_assignment(word) {
                idx = idx.saturating_add(1);
            } else {
                break;
            }
        }
        idx
    }
}

fn is_env_assignment(word: &str) -> bool {
    let Some((name, _)) = word.split_once('=') else {
        return false;
    };
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn basename(word: &str) -> &str {
    word.rsplit('/').next().unwrap_or(word)
}
