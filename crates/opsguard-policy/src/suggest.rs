//! Ranked safe alternatives for forbidden and denylisted commands.
//!
//! Suggestions are best-effort rewrites of the command as typed, ordered
//! from the closest safe equivalent to general advice.

use crate::command::{ParsedCommand, flag_matches};
use crate::patterns::{Domain, PatternMatch};

/// Advice attached to every permanently blocked command.
pub const MANUAL_REVIEW: &str =
    "This operation is permanently blocked for automation; perform it manually after peer review";

/// Advice attached to cluster mutations under a reconciliation workflow.
pub const GITOPS_ADVICE: &str =
    "Commit the manifest change to the GitOps repository and let the controller reconcile it";

const FEATURE_BRANCH: &str = "Push to a feature branch and open a pull request instead";

const FORCE_FLAGS: &[&str] = &["--force", "-f"];

/// Ranked alternatives for a command that matched `hit`.
#[must_use]
pub fn suggest(cmd: &ParsedCommand, hit: &PatternMatch) -> Vec<String> {
    let mut out = Vec::new();
    if hit.is_denylist() {
        out.push(MANUAL_REVIEW.to_owned());
        if cmd.program() == "git" {
            out.push(FEATURE_BRANCH.to_owned());
        }
        return out;
    }

    let domain = domain_of(&hit.category);
    let raw = cmd.raw();
    match (domain, cmd.program()) {
        (Some(Domain::Kubernetes), "kubectl" | "oc") => {
            out.push(format!("Preview with `{raw} --dry-run=server`"));
            out.push(format!("Preview locally with `{raw} --dry-run=client`"));
            if let Some(diff) = swap_word(raw, &["apply", "replace"], "diff") {
                out.push(format!("Show the pending changes with `{diff}`"));
            }
            if let Some(get) = swap_word(raw, &["delete"], "get") {
                out.push(format!("Inspect the target first with `{get}`"));
            }
        },
        (Some(Domain::Infrastructure), "terraform" | "tofu" | "terragrunt") => {
            if let Some(plan) = swap_word(raw, &["destroy"], "plan -destroy") {
                out.push(format!("Review the destruction plan with `{plan}`"));
            } else if let Some(plan) = swap_word(raw, &["apply"], "plan") {
                out.push(format!("Review the plan with `{plan}`"));
            }
        },
        (Some(Domain::Infrastructure), "pulumi") => {
            if let Some(preview) = swap_word(raw, &["up", "update", "destroy"], "preview") {
                out.push(format!("Review the change with `{preview}`"));
            }
        },
        (Some(Domain::Release), _) => {
            out.push(format!("Preview with `{raw} --dry-run`"));
            if let Some(template) = swap_word(raw, &["install", "upgrade"], "template") {
                out.push(format!("Render the manifests with `{template}`"));
            }
        },
        (Some(Domain::Gitops), _) => {
            if let Some(diff) = swap_word(raw, &["sync"], "diff") {
                out.push(format!("Show the pending changes with `{diff}`"));
            }
            out.push(GITOPS_ADVICE.to_owned());
        },
        (Some(Domain::Git), "git") => git_alternatives(cmd, &mut out),
        (Some(Domain::Filesystem), program) => match program {
            "sed" | "yq" => {
                out.push(format!(
                    "Preview the edit on stdout with `{}`",
                    drop_flags(raw, &["-i", "--in-place", "--inplace"])
                ));
            },
            "find" => {
                out.push(format!(
                    "List the matches first with `{}`",
                    drop_flags(raw, &["-delete"])
                ));
            },
            "rm" | "rmdir" | "shred" | "truncate" | "unlink" => {
                let targets: Vec<&str> = cmd.positionals().collect();
                if !targets.is_empty() {
                    out.push(format!("List the targets first with `ls -la {}`", targets.join(" ")));
                }
            },
            _ => {},
        },
        (Some(Domain::Network), _) => {
            out.push("Use a read-only GET request to inspect the resource first".to_owned());
        },
        (Some(Domain::Aws), _) => {
            if cmd.positionals().next() == Some("s3") {
                out.push(format!("Preview with `{raw} --dryrun`"));
            } else {
                out.push(format!("Check permissions without changes using `{raw} --dry-run`"));
            }
            out.push("Inspect the resource with the matching `describe-*` or `get-*` call".to_owned());
        },
        (Some(Domain::Gcp), _) => {
            out.push("Inspect the resource with the matching `describe` or `list` call".to_owned());
        },
        _ => {},
    }
    out
}

fn git_alternatives(cmd: &ParsedCommand, out: &mut Vec<String>) {
    let raw = cmd.raw();
    let verb = cmd.positionals().next().unwrap_or_default();
    match verb {
        "push" => {
            if cmd.has_any_flag(FORCE_FLAGS) {
                out.push(format!(
                    "Use `{}` so the push fails if the remote moved",
                    replace_flags(raw, FORCE_FLAGS, "--force-with-lease")
                ));
            }
            out.push(FEATURE_BRANCH.to_owned());
        },
        "reset" => {
            out.push("Stash local changes first with `git stash push`".to_owned());
            out.push(format!("Use `{}` to keep the working tree", replace_flags(raw, &["--hard"], "--soft")));
        },
        "clean" => {
            out.push(format!(
                "Preview what would be removed with `{}`",
                replace_flags(raw, &["-f", "--force"], "-n")
            ));
        },
        "branch" => {
            out.push(format!(
                "Use `{}` so only merged branches are deleted",
                replace_flags(raw, &["-D"], "-d")
            ));
        },
        _ => {},
    }
}

fn domain_of(category: &str) -> Option<Domain> {
    [
        Domain::Kubernetes,
        Domain::Infrastructure,
        Domain::Release,
        Domain::Gitops,
        Domain::Git,
        Domain::Filesystem,
        Domain::Network,
        Domain::Aws,
        Domain::Gcp,
        Domain::Custom,
    ]
    .into_iter()
    .find(|d| d.name() == category)
}

/// Replace the first whitespace-separated word equal to one of `from`.
fn swap_word(raw: &str, from: &[&str], to: &str) -> Option<String> {
    let mut words: Vec<&str> = raw.split_whitespace().collect();
    let idx = words
        .iter()
        .position(|w| from.iter().any(|f| w.eq_ignore_ascii_case(f)))?;
    if let Some(slot) = words.get_mut(idx) {
        *slot = to;
    }
    Some(words.join(" "))
}

/// Remove every word that is one of `flags`.
fn drop_flags(raw: &str, flags: &[&str]) -> String {
    raw.split_whitespace()
        .filter(|w| !flags.iter().any(|f| flag_matches(w, f)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace every word that is one of `flags` with `replacement`, once.
fn replace_flags(raw: &str, flags: &[&str], replacement: &str) -> String {
    let mut replaced = false;
    raw.split_whitespace()
        .filter_map(|w| {
            if flags.iter().any(|f| w == *f || w.starts_with(&format!("{f}="))) {
                if replaced {
                    return None;
                }
                replaced = true;
                return Some(replacement);
            }
            Some(w)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
