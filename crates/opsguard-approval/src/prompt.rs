//! Human-readable rendering of a realization package.
//!
//! The summary lists, in order:
//! 1. Title and tier
//! 2. Files (capped, then `+N more`)
//! 3. Version-control operations, each with commit message, branch, remote and push command
//! 4. Affected resources grouped by kind (capped per group)
//! 5. Pre-flight warnings, if any
//! 6. Impact estimate, if any
//!
//! Counts are always the full totals, never the number displayed.

use opsguard_core::RealizationPackage;
use serde::Serialize;

use crate::settings::ApprovalSettings;

const INDENT: &str = "  ";

/// What is shown to the human before asking for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalPrompt {
    /// Multi-line change-set summary.
    pub summary: String,
    /// The question, naming the canonical responses.
    pub decision_prompt: String,
}

impl ApprovalPrompt {
    /// Summary and question as one block of text.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.summary, self.decision_prompt)
    }
}

pub(crate) fn build(package: &RealizationPackage, settings: &ApprovalSettings) -> ApprovalPrompt {
    let mut lines = Vec::new();

    lines.push(format!(
        "Realization package: {}",
        package.title.as_deref().unwrap_or("(untitled)")
    ));
    let tier = match package.tier {
        Some(tier) => tier.to_string(),
        None => format!("{} (unclassified)", package.effective_tier()),
    };
    lines.push(format!("Tier: {tier}"));

    if package.is_empty() {
        lines.push(String::new());
        lines.push("No side-effecting operations.".to_owned());
    }

    if !package.files.is_empty() {
        lines.push(String::new());
        lines.push(format!("Files ({}):", package.files.len()));
        for file in package.files.iter().take(settings.max_files_shown) {
            lines.push(format!("{INDENT}- {} {}", file.action, file.path));
        }
        push_overflow(&mut lines, INDENT, package.files.len(), settings.max_files_shown);
    }

    let vcs: Vec<_> = package.vcs.iter().filter(|op| !op.is_empty()).collect();
    if !vcs.is_empty() {
        lines.push(String::new());
        lines.push(format!("Version control ({}):", vcs.len()));
        for op in vcs {
            let mut first = true;
            let fields = [
                ("commit", op.commit_message.as_deref()),
                ("branch", op.branch.as_deref()),
                ("remote", op.remote.as_deref()),
                ("push", op.push_command.as_deref()),
            ];
            for (label, value) in fields {
                let Some(value) = value else { continue };
                let bullet = if first { "- " } else { "  " };
                first = false;
                // Multi-line commit messages show their subject only.
                let value = value.lines().next().unwrap_or_default();
                lines.push(format!("{INDENT}{bullet}{label}: {value}"));
            }
        }
    }

    if !package.resources.is_empty() {
        lines.push(String::new());
        lines.push(format!("Resources ({}):", package.resources.len()));
        for (kind, group) in package.resources_by_kind() {
            lines.push(format!("{INDENT}{kind} ({}):", group.len()));
            for resource in group.iter().take(settings.max_resources_per_group) {
                let action = resource
                    .action
                    .as_deref()
                    .map(|a| format!(" [{a}]"))
                    .unwrap_or_default();
                lines.push(format!(
                    "{INDENT}{INDENT}- {}{action}",
                    resource.qualified_name()
                ));
            }
            push_overflow(
                &mut lines,
                &format!("{INDENT}{INDENT}"),
                group.len(),
                settings.max_resources_per_group,
            );
        }
    }

    if !package.warnings.is_empty() {
        lines.push(String::new());
        lines.push(format!("Warnings ({}):", package.warnings.len()));
        for warning in &package.warnings {
            lines.push(format!("{INDENT}! {warning}"));
        }
    }

    if let Some(impact) = &package.impact
        && (impact.downtime.is_some() || impact.risk_level.is_some())
    {
        lines.push(String::new());
        lines.push("Impact:".to_owned());
        if let Some(downtime) = &impact.downtime {
            lines.push(format!("{INDENT}Downtime: {downtime}"));
        }
        if let Some(risk) = impact.risk_level {
            lines.push(format!("{INDENT}Risk level: {risk}"));
        }
    }

    let decision_prompt = format!(
        "Type '{}' to proceed or '{}' to abort. Any other response asks for clarification.",
        settings.approve_token, settings.reject_token
    );

    ApprovalPrompt {
        summary: lines.join("\n"),
        decision_prompt,
    }
}

fn push_overflow(lines: &mut Vec<String>, indent: &str, total: usize, shown: usize) {
    let hidden = total.saturating_sub(shown);
    if hidden > 0 {
        lines.push(format!("{indent}+{hidden} more"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsguard_core::{
        AffectedResource, FileAction, FileChange, ImpactEstimate, RiskLevel, SecurityTier,
        VcsOperation,
    };

    fn files(n: usize) -> Vec<FileChange> {
        (0..n)
            .map(|i| FileChange::new(format!("k8s/app-{i}.yaml"), FileAction::Create))
            .collect()
    }

    #[test]
    fn test_files_are_capped_with_total_count() {
        let package = RealizationPackage {
            files: files(15),
            ..Default::default()
        };
        let prompt = build(&package, &ApprovalSettings::default());

        assert!(prompt.summary.contains("Files (15):"));
        let listed = prompt
            .summary
            .lines()
            .filter(|l| l.starts_with("  - create k8s/app-"))
            .count();
        assert_eq!(listed, 10);
        assert!(prompt.summary.contains("  +5 more"));
        assert!(!prompt.summary.contains("app-10.yaml"));
    }

    #[test]
    fn test_exactly_at_cap_has_no_overflow_line() {
        let package = RealizationPackage {
            files: files(10),
            ..Default::default()
        };
        let prompt = build(&package, &ApprovalSettings::default());
        assert!(!prompt.summary.contains("more"));
    }

    #[test]
    fn test_vcs_operation_lists_every_field() {
        let package = RealizationPackage {
            vcs: vec![VcsOperation {
                commit_message: Some("feat(api): scale workers\n\nlong body".to_owned()),
                branch: Some("feat/scale".to_owned()),
                remote: Some("origin".to_owned()),
                push_command: Some("git push origin feat/scale".to_owned()),
            }],
            ..Default::default()
        };
        let summary = build(&package, &ApprovalSettings::default()).summary;
        assert!(summary.contains("Version control (1):"));
        assert!(summary.contains("  - commit: feat(api): scale workers"));
        assert!(!summary.contains("long body"));
        assert!(summary.contains("    branch: feat/scale"));
        assert!(summary.contains("    remote: origin"));
        assert!(summary.contains("    push: git push origin feat/scale"));
    }

    #[test]
    fn test_resources_grouped_and_capped_per_kind() {
        let mut resources: Vec<_> = (0..7)
            .map(|i| {
                AffectedResource::new("Deployment", format!("svc-{i}"))
                    .with_namespace("prod")
                    .with_action("update")
            })
            .collect();
        resources.push(AffectedResource::new("aws_s3_bucket", "logs").with_action("delete"));
        let package = RealizationPackage {
            resources,
            ..Default::default()
        };
        let summary = build(&package, &ApprovalSettings::default()).summary;

        assert!(summary.contains("Resources (8):"));
        assert!(summary.contains("  Deployment (7):"));
        assert!(summary.contains("    - prod/svc-4 [update]"));
        assert!(!summary.contains("svc-5"));
        assert!(summary.contains("    +2 more"));
        assert!(summary.contains("  aws_s3_bucket (1):"));
        assert!(summary.contains("    - logs [delete]"));
    }

    #[test]
    fn test_warnings_and_impact_only_when_present() {
        let bare = RealizationPackage {
            files: files(1),
            ..Default::default()
        };
        let summary = build(&bare, &ApprovalSettings::default()).summary;
        assert!(!summary.contains("Warnings"));
        assert!(!summary.contains("Impact"));

        let package = RealizationPackage {
            title: Some("Scale API".to_owned()),
            tier: Some(SecurityTier::Destructive),
            files: files(1),
            warnings: vec!["HPA will be overridden".to_owned()],
            impact: Some(ImpactEstimate {
                downtime: Some("none".to_owned()),
                risk_level: Some(RiskLevel::High),
            }),
            ..Default::default()
        };
        let summary = build(&package, &ApprovalSettings::default()).summary;
        assert!(summary.starts_with("Realization package: Scale API\nTier: T3_DESTRUCTIVE"));
        assert!(summary.contains("  ! HPA will be overridden"));
        assert!(summary.contains("  Downtime: none"));
        assert!(summary.contains("  Risk level: high"));
    }

    #[test]
    fn test_unclassified_and_empty_package() {
        let summary = build(&RealizationPackage::default(), &ApprovalSettings::default()).summary;
        assert!(summary.contains("Tier: T3_DESTRUCTIVE (unclassified)"));
        assert!(summary.contains("No side-effecting operations."));
    }

    #[test]
    fn test_decision_prompt_names_tokens() {
        let settings = ApprovalSettings {
            approve_token: "yes, deploy".to_owned(),
            reject_token: "no".to_owned(),
            ..Default::default()
        };
        let prompt = build(&RealizationPackage::default(), &settings);
        assert!(prompt.decision_prompt.contains("'yes, deploy'"));
        assert!(prompt.decision_prompt.contains("'no'"));
        assert!(prompt.render().ends_with(&prompt.decision_prompt));
    }
}
