//! Pattern tables: per-domain rules that recognize safe, forbidden and
//! irreversible commands.
//!
//! Rules are evaluated globally in [`RuleKind::EVALUATION_ORDER`]:
//!
//! 1. Denylist rules of every domain, then operator-configured entries
//! 2. Always-forbidden rules of the command's domain
//! 3. Conditional-safe rules whose dangerous flags are present
//! 4. Safe rules (or the domain's denylist strategy)
//!
//! The first rule that fires decides. Domains are chosen by program name,
//! so `aws` rules never see a `kubectl` command.

mod rule;
mod tables;


pub use rule::{Domain, FlagCondition, Rule, RuleKind, Strategy};

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::command::ParsedCommand;
use crate::error::{PolicyError, PolicyResult};
use crate::settings::PolicySettings;

/// Verbs that write even when the invocation looks like a validation step.
const WRITE_TOKENS: &[&str] = &["apply", "destroy", "delete", "install", "upgrade", "sync", "push"];

/// A forbidden or denylist rule that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    /// Kind of the rule that fired.
    pub kind: RuleKind,
    /// Category name (`kubernetes`, `git`, `custom`, ...).
    pub category: String,
    /// Pattern source.
    pub pattern: String,
    /// Human description.
    pub description: String,
    /// The dangerous flag that turned a conditional-safe rule forbidden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

impl PatternMatch {
    fn from_rule(rule: &Rule, flag: Option<&str>) -> Self {
        Self {
            kind: rule.kind(),
            category: rule.domain().name().to_owned(),
            pattern: rule.pattern().to_owned(),
            description: rule.description().to_owned(),
            flag: flag.map(str::to_owned),
        }
    }

    /// Whether the match blocks the command outright.
    #[must_use]
    pub fn is_denylist(&self) -> bool {
        self.kind == RuleKind::Denylist
    }
}

/// The rules for one tool family.
#[derive(Debug, Clone)]
pub struct DomainTable {
    domain: Domain,
    strategy: Strategy,
    programs: &'static [&'static str],
    credentials: CredentialNeed,
    rules: Vec<Rule>,
}

/// Whether a domain's commands need live credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CredentialNeed {
    Never,
    Always,
    /// Always for `programs`, otherwise only for these sub-commands
    /// (one of the first two positionals).
    Remote {
        programs: &'static [&'static str],
        verbs: &'static [&'static str],
    },
}

impl DomainTable {
    /// The table's domain.
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// The table's safe-decision strategy.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// All rules, in table order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn rules_of(&self, kind: RuleKind) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.kind() == kind)
    }

    fn owns(&self, program: &str) -> bool {
        self.programs.iter().any(|p| match p.strip_suffix('*') {
            Some(prefix) => program.starts_with(prefix),
            None => program == *p,
        })
    }
}

/// Every domain table plus operator denylist entries.
#[derive(Debug, Clone)]
pub struct PatternTable {
    domains: Vec<DomainTable>,
    custom: Vec<Rule>,
    validation: Vec<Regex>,
    by_program: HashMap<&'static str, usize>,
}

impl PatternTable {
    /// Build the built-in tables, extended by `settings`.
    ///
    /// Protected branch names feed the git denylist and
    /// `extra_denylist` entries become rules of category `custom`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPattern`] if an operator pattern does
    /// not compile, or [`PolicyError::InvalidBranch`] for an empty branch name.
    pub fn new(settings: &PolicySettings) -> PolicyResult<Self> {
        let domains = tables::builtin(settings)?;
        let custom = settings
            .extra_denylist
            .iter()
            .map(|pattern| {
                Rule::new(
                    RuleKind::Denylist,
                    Domain::Custom,
                    pattern,
                    format!("operator denylist entry `{pattern}`"),
                    None,
                )
            })
            .collect::<PolicyResult<Vec<_>>>()?;
        let validation = tables::validation_patterns()
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| PolicyError::InvalidPattern {
                    pattern: (*pattern).to_owned(),
                    source,
                })
            })
            .collect::<PolicyResult<Vec<_>>>()?;

        let mut by_program = HashMap::new();
        for (idx, table) in domains.iter().enumerate() {
            for program in table.programs.iter().filter(|p| !p.ends_with('*')) {
                by_program.insert(*program, idx);
            }
        }

        Ok(Self {
            domains,
            custom,
            validation,
            by_program,
        })
    }

    /// The domain table responsible for `program`, if any.
    #[must_use]
    pub fn domain_for(&self, program: &str) -> Option<&DomainTable> {
        if program.is_empty() {
            return None;
        }
        match self.by_program.get(program) {
            Some(idx) => self.domains.get(*idx),
            None => self.domains.iter().find(|t| t.owns(program)),
        }
    }

    /// All domain tables.
    #[must_use]
    pub fn domains(&self) -> &[DomainTable] {
        &self.domains
    }

    /// The first denylist rule matching `cmd`, across every domain.
    #[must_use]
    pub fn matches_denylist(&self, cmd: &ParsedCommand) -> Option<PatternMatch> {
        self.domains
            .iter()
            .flat_map(|t| t.rules_of(RuleKind::Denylist))
            .chain(self.custom.iter())
            .find(|rule| rule.applies(cmd))
            .map(|rule| PatternMatch::from_rule(rule, None))
    }

    /// The first forbidden rule that fires for `cmd`, denylist included.
    ///
    /// A conditional-safe rule fires as forbidden when one of its
    /// dangerous flags is present.
    #[must_use]
    pub fn matches_forbidden(&self, cmd: &ParsedCommand) -> Option<PatternMatch> {
        if let Some(hit) = self.matches_denylist(cmd) {
            return Some(hit);
        }
        let table = self.domain_for(cmd.program())?;
        if let Some(rule) = table
            .rules_of(RuleKind::AlwaysForbidden)
            .find(|rule| rule.applies(cmd))
        {
            return Some(PatternMatch::from_rule(rule, None));
        }
        table
            .rules_of(RuleKind::ConditionalSafe)
            .filter(|rule| rule.pattern_matches(cmd))
            .find_map(|rule| match rule.condition() {
                Some(FlagCondition::Unless(flags)) => cmd
                    .first_flag(flags)
                    .map(|flag| PatternMatch::from_rule(rule, Some(flag))),
                _ => None,
            })
    }

    /// Whether `cmd` is recognized as read-only.
    ///
    /// Never true for a command that [`matches_forbidden`](Self::matches_forbidden).
    #[must_use]
    pub fn matches_safe(&self, cmd: &ParsedCommand) -> bool {
        let Some(table) = self.domain_for(cmd.program()) else {
            return false;
        };
        if self.matches_forbidden(cmd).is_some() {
            return false;
        }
        match table.strategy {
            Strategy::Denylist => true,
            Strategy::Allowlist => table
                .rules_of(RuleKind::ConditionalSafe)
                .chain(table.rules_of(RuleKind::AlwaysSafe))
                .any(|rule| rule.applies(cmd)),
        }
    }

    /// Whether `cmd` is a lint, plan or render step that writes nothing.
    #[must_use]
    pub fn matches_validation(&self, cmd: &ParsedCommand) -> bool {
        if !self.validation.iter().any(|re| re.is_match(cmd.normalized())) {
            return false;
        }
        !cmd
            .positionals()
            .any(|word| WRITE_TOKENS.contains(&word.to_ascii_lowercase().as_str()))
    }

    /// Whether `cmd` talks to a cluster, cloud account or remote forge.
    #[must_use]
    pub fn requires_credentials(&self, cmd: &ParsedCommand) -> bool {
        let Some(table) = self.domain_for(cmd.program()) else {
            return false;
        };
        match table.credentials {
            CredentialNeed::Never => false,
            CredentialNeed::Always => true,
            CredentialNeed::Remote { programs, verbs } => {
                programs.contains(&cmd.program())
                    || cmd
                        .positionals()
                        .take(2)
                        .any(|verb| verbs.contains(&verb.to_ascii_lowercase().as_str()))
            },
        }
    }
}
