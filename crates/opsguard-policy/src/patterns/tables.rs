//! Built-in domain tables.
//!
//! Every pattern matches the lower-cased normalized command produced by
//! [`ParsedCommand`](crate::command::ParsedCommand), so `Kubectl Delete NS x`
//! and `kubectl delete ns x` hit the same rule.

use super::rule::{Domain, FlagCondition, Rule, RuleKind, Strategy};
use super::{CredentialNeed, DomainTable};
use crate::error::{PolicyError, PolicyResult};
use crate::settings::PolicySettings;

/// Global flags between a program and its verb (`kubectl -n prod --context x get`).
const GLOBAL_FLAGS: &str = r"(?:\s+--?[\w.-]+(?:=\S+|\s+[^-\s]\S*)?)*";

/// Flags that make `git push` rewrite or delete remote refs.
const FORCE_PUSH_FLAGS: &[&str] = &[
    "--force",
    "-f",
    "--force-with-lease",
    "--force-if-includes",
    "--mirror",
    "--delete",
    "-d",
    "--prune",
];

/// `^tool <global flags> rest`.
fn cmd(tools: &str, rest: &str) -> String {
    format!(r"^(?:{tools}){GLOBAL_FLAGS}\s+{rest}")
}

/// `^tool <global flags> (verb|verb ...)` followed by a word boundary.
fn verbs(tools: &str, list: &str) -> String {
    cmd(tools, &format!(r"(?:{list})(?:\s|$)"))
}

struct TableBuilder {
    domain: Domain,
    strategy: Strategy,
    programs: &'static [&'static str],
    credentials: CredentialNeed,
    specs: Vec<(RuleKind, String, &'static str, Option<FlagCondition>)>,
}

impl TableBuilder {
    fn new(domain: Domain, programs: &'static [&'static str]) -> Self {
        Self {
            domain,
            strategy: Strategy::Allowlist,
            programs,
            credentials: CredentialNeed::Always,
            specs: Vec::new(),
        }
    }

    fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn credentials(mut self, need: CredentialNeed) -> Self {
        self.credentials = need;
        self
    }

    fn push(
        mut self,
        kind: RuleKind,
        pattern: impl Into<String>,
        description: &'static str,
        condition: Option<FlagCondition>,
    ) -> Self {
        self.specs.push((kind, pattern.into(), description, condition));
        self
    }

    fn denylist(self, pattern: impl Into<String>, description: &'static str) -> Self {
        self.push(RuleKind::Denylist, pattern, description, None)
    }

    fn denylist_when(
        self,
        pattern: impl Into<String>,
        flags: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        self.push(
            RuleKind::Denylist,
            pattern,
            description,
            Some(FlagCondition::Requires(flags)),
        )
    }

    fn forbidden(self, pattern: impl Into<String>, description: &'static str) -> Self {
        self.push(RuleKind::AlwaysForbidden, pattern, description, None)
    }

    fn forbidden_when(
        self,
        pattern: impl Into<String>,
        flags: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        self.push(
            RuleKind::AlwaysForbidden,
            pattern,
            description,
            Some(FlagCondition::Requires(flags)),
        )
    }

    fn conditional(
        self,
        pattern: impl Into<String>,
        dangerous: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        self.push(
            RuleKind::ConditionalSafe,
            pattern,
            description,
            Some(FlagCondition::Unless(dangerous)),
        )
    }

    fn safe(self, pattern: impl Into<String>, description: &'static str) -> Self {
        self.push(RuleKind::AlwaysSafe, pattern, description, None)
    }

    fn build(self) -> PolicyResult<DomainTable> {
        let domain = self.domain;
        let rules = self
            .specs
            .into_iter()
            .map(|(kind, pattern, description, condition)| {
                Rule::new(kind, domain, &pattern, description, condition)
            })
            .collect::<PolicyResult<Vec<_>>>()?;
        Ok(DomainTable {
            domain,
            strategy: self.strategy,
            programs: self.programs,
            credentials: self.credentials,
            rules,
        })
    }
}

/// All built-in domain tables, in evaluation order.
pub(super) fn builtin(settings: &PolicySettings) -> PolicyResult<Vec<DomainTable>> {
    Ok(vec![
        kubernetes()?,
        infrastructure()?,
        release()?,
        gitops()?,
        git(&settings.protected_branches)?,
        filesystem()?,
        network()?,
        aws()?,
        gcp()?,
    ])
}

fn kubernetes() -> PolicyResult<DomainTable> {
    const K: &str = "kubectl|oc";
    TableBuilder::new(
        Domain::Kubernetes,
        &["kubectl", "oc", "eksctl", "kind", "kustomize"],
    )
    .denylist(
        cmd(
            K,
            r"delete(?:\s+-\S+(?:\s+[^-\s]\S*)?)*\s+(?:[\w.-]+,)*(?:ns|namespaces?|projects?)(?:[/\s,]|$)",
        ),
        "delete a namespace",
    )
    .denylist(r"^eksctl\s+delete\s+cluster(?:\s|$)", "delete an EKS cluster")
    .denylist(r"^kind\s+delete\s+clusters?(?:\s|$)", "delete a cluster")
    .forbidden(
        verbs(
            K,
            r"delete|drain|cordon|uncordon|taint|patch|replace|edit|scale|autoscale|apply|create|set|label|annotate|expose|run|exec|cp|rollout\s+(?:restart|undo|pause|resume)",
        ),
        "mutate cluster state",
    )
    .forbidden(
        r"^eksctl\s+(?:create|delete|upgrade|scale|drain|update|set|unset)(?:\s|$)",
        "mutate an EKS cluster",
    )
    .safe(
        verbs(
            K,
            r"get|describe|logs|top|explain|api-resources|api-versions|version|cluster-info|events|whoami|projects|status|auth\s+(?:can-i|whoami)|config\s+(?:view|get-contexts|current-context|get-clusters)|rollout\s+(?:status|history)",
        ),
        "read cluster state",
    )
    .safe(r"^eksctl\s+(?:get|info|version)(?:\s|$)", "read EKS state")
    .safe(r"^kind\s+(?:get|version)(?:\s|$)", "list local clusters")
    .build()
}

fn infrastructure() -> PolicyResult<DomainTable> {
    const TF: &str = "terraform|tofu|terragrunt";
    TableBuilder::new(
        Domain::Infrastructure,
        &["terraform", "tofu", "terragrunt", "pulumi"],
    )
    .denylist_when(
        verbs(TF, "destroy|run-all\\s+destroy"),
        &["-auto-approve", "--auto-approve"],
        "destroy infrastructure without confirmation",
    )
    .denylist_when(
        cmd(TF, r"(?:run-all\s+)?apply\s+(?:.*\s)?--?destroy(?:\s|=true|$)"),
        &["-auto-approve", "--auto-approve"],
        "destroy infrastructure without confirmation",
    )
    .denylist_when(
        verbs("pulumi", "destroy"),
        &["--yes", "-y", "--skip-preview"],
        "destroy a stack without confirmation",
    )
    .forbidden(
        verbs(
            TF,
            r"apply|destroy|import|taint|untaint|force-unlock|refresh|state\s+(?:rm|mv|push|replace-provider)|workspace\s+delete|run-all\s+(?:apply|destroy)",
        ),
        "change infrastructure state",
    )
    .forbidden(
        verbs(
            "pulumi",
            r"up|update|destroy|refresh|import|cancel|stack\s+rm|state\s+(?:delete|unprotect)",
        ),
        "change a pulumi stack",
    )
    .safe(
        verbs(
            TF,
            r"show|output|version|providers|graph|console|state\s+(?:list|show|pull)|workspace\s+(?:list|show)",
        ),
        "read infrastructure state",
    )
    .safe(
        verbs(
            "pulumi",
            r"whoami|version|about|stack\s+(?:ls|output|history)|config\s+get",
        ),
        "read a pulumi stack",
    )
    .build()
}

fn release() -> PolicyResult<DomainTable> {
    TableBuilder::new(Domain::Release, &["helm", "helmfile"])
        .forbidden(
            verbs("helm", "install|upgrade|uninstall|delete|rollback|push"),
            "change a release",
        )
        .forbidden(
            verbs("helmfile", "apply|sync|destroy|delete"),
            "change releases",
        )
        .safe(
            verbs(
                "helm",
                r"list|ls|status|history|get|show|inspect|search|version|env|repo\s+list|dependency\s+list|plugin\s+list",
            ),
            "read release state",
        )
        .safe(verbs("helmfile", "list|status|version"), "read release state")
        .build()
}

fn gitops() -> PolicyResult<DomainTable> {
    TableBuilder::new(Domain::Gitops, &["flux", "argocd"])
        .forbidden(
            verbs(
                "flux",
                "delete|suspend|resume|reconcile|create|bootstrap|install|uninstall",
            ),
            "change reconciliation state",
        )
        .forbidden(
            verbs(
                "argocd",
                r"app\s+(?:delete|sync|rollback|set|unset|patch|create|terminate-op)|appset\s+(?:create|delete)|cluster\s+(?:add|rm)|proj\s+(?:create|delete)|repo\s+(?:add|rm)",
            ),
            "change an argocd application",
        )
        .safe(
            verbs(
                "flux",
                "get|logs|check|version|stats|trace|tree|events|export",
            ),
            "read reconciliation state",
        )
        .safe(
            verbs(
                "argocd",
                r"version|context|app\s+(?:list|get|history|manifests|logs|resources)|cluster\s+list|proj\s+(?:list|get)|repo\s+list|account\s+(?:list|get-user-info)",
            ),
            "read argocd state",
        )
        .build()
}

fn protected_branch_alternation(branches: &[String]) -> PolicyResult<Option<String>> {
    let mut parts = Vec::with_capacity(branches.len());
    for branch in branches {
        let trimmed = branch.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(PolicyError::InvalidBranch(branch.clone()));
        }
        parts.push(regex::escape(&trimmed.to_lowercase()).replace(r"\*", r"\S*"));
    }
    Ok((!parts.is_empty()).then(|| parts.join("|")))
}

fn git(protected: &[String]) -> PolicyResult<DomainTable> {
    let mut table = TableBuilder::new(Domain::Git, &["git", "gh"])
        .credentials(CredentialNeed::Remote {
            programs: &["gh"],
            verbs: &["push", "pull", "fetch", "clone", "ls-remote"],
        });

    if let Some(branches) = protected_branch_alternation(protected)? {
        let target = format!(r"(?:\S+:)?(?:refs/heads/)?(?:{branches})(?:\s|$)");
        table = table
            .denylist_when(
                cmd("git", &format!(r"push\s+(?:.*\s)?{target}")),
                FORCE_PUSH_FLAGS,
                "force-push or delete a protected branch",
            )
            .denylist(
                cmd("git", &format!(r"push\s+(?:.*\s)?\+{target}")),
                "force-push a protected branch",
            )
            .denylist(
                cmd(
                    "git",
                    &format!(r"push\s+(?:.*\s)?:(?:refs/heads/)?(?:{branches})(?:\s|$)"),
                ),
                "delete a protected branch",
            );
    }

    table
        .denylist(verbs("gh", r"repo\s+delete"), "delete a repository")
        .forbidden_when(
            verbs("git", "push"),
            FORCE_PUSH_FLAGS,
            "rewrite or delete remote refs",
        )
        .forbidden(cmd("git", r"push\s+(?:.*\s)?\+\S+"), "force-push via +refspec")
        .forbidden(cmd("git", r"push\s+(?:.*\s)?:\S+"), "delete a remote branch")
        .forbidden_when(verbs("git", "reset"), &["--hard", "--merge"], "discard local commits")
        .forbidden_when(verbs("git", "clean"), &["-f", "--force"], "delete untracked files")
        .forbidden_when(
            verbs("git", "branch"),
            &["-d", "-D", "--delete"],
            "delete a branch",
        )
        .forbidden_when(verbs("git", "tag"), &["-d", "--delete"], "delete a tag")
        .forbidden(
            verbs(
                "git",
                r"filter-branch|filter-repo|reflog\s+(?:expire|delete)|stash\s+(?:drop|clear)|update-ref\s+-d",
            ),
            "irreversibly rewrite history",
        )
        .forbidden(
            cmd("git", r"checkout\s+(?:--\s+)?\.(?:\s|$)"),
            "discard working tree changes",
        )
        .forbidden(
            verbs(
                "gh",
                r"(?:release|secret|variable|label|run|cache)\s+delete|repo\s+(?:archive|rename|edit)|pr\s+merge|workflow\s+disable|api\s+.*(?:-x|--method)[\s=]*(?:delete|post|put|patch)",
            ),
            "mutate a hosted repository",
        )
        .safe(
            verbs(
                "git",
                "status|log|diff|show|blame|shortlog|describe|rev-parse|rev-list|ls-files|ls-tree|ls-remote|cat-file|grep|fetch|version|help|whatchanged|merge-base|name-rev|for-each-ref|check-ignore",
            ),
            "read repository state",
        )
        .safe(cmd("git", r"branch(?:\s+-\S+)*$"), "list branches")
        .safe(cmd("git", r"tag(?:\s+(?:-l|--list|-n\d*))*$"), "list tags")
        .safe(cmd("git", r"remote(?:\s+-v)?$"), "list remotes")
        .safe(
            verbs("git", r"remote\s+(?:show|get-url)|stash\s+(?:list|show)|worktree\s+list"),
            "read repository state",
        )
        .safe(cmd("git", r"reflog(?:\s+show)?(?:\s|$)"), "read the reflog")
        .safe(
            cmd("git", r"config\s+(?:--get|--get-all|--get-regexp|--list|-l)(?:\s|$)"),
            "read git configuration",
        )
        .safe(
            verbs(
                "gh",
                r"status|version|auth\s+status|search\s+\S+|(?:pr|issue|run|release|repo|workflow|gist|label|secret|variable)\s+(?:list|view|status|diff|checks|watch)",
            ),
            "read hosted repository state",
        )
        .build()
}

fn filesystem() -> PolicyResult<DomainTable> {
    TableBuilder::new(
        Domain::Filesystem,
        &[
            "rm", "rmdir", "unlink", "shred", "truncate", "wipefs", "dd", "mkfs*", "chmod",
            "chown", "chgrp", "find", "sed", "yq", "sort", "ls", "cat", "head", "tail", "less",
            "more", "grep", "egrep", "fgrep", "rg", "ag", "wc", "echo", "printf", "pwd", "whoami",
            "which", "whereis", "type", "date", "uname", "hostname", "id", "df", "du", "stat",
            "file", "tree", "jq", "uniq", "cut", "tr", "diff", "cmp", "basename", "dirname",
            "realpath", "readlink", "true", "false", "sleep", "ps", "free", "uptime", "printenv",
            "base64", "md5sum", "sha1sum", "sha256sum", "column", "nl", "fold", "comm", "seq",
        ],
    )
    .credentials(CredentialNeed::Never)
    .denylist_when(
        r"^rm\s+(?:.*\s)?(?:/|/\*|~|~/|\$home|/etc|/usr|/var|/boot|/home)(?:\s|$)",
        &["-r", "-R", "--recursive"],
        "recursively delete a system or home directory",
    )
    .denylist(r"^rm\s+(?:.*\s)?--no-preserve-root(?:\s|$)", "delete the root filesystem")
    .denylist(r"^mkfs(?:\.\w+)?(?:\s|$)", "format a filesystem")
    .denylist(
        r"^dd\s+(?:.*\s)?of=/dev/(?:sd|hd|nvme|xvd|vd|disk|mmcblk)",
        "overwrite a block device",
    )
    .forbidden(
        r"^(?:rm|rmdir|unlink|shred|truncate|wipefs|dd)(?:\s|$)",
        "delete or overwrite files",
    )
    .forbidden_when(
        r"^(?:chmod|chown|chgrp)(?:\s|$)",
        &["-R", "--recursive"],
        "recursively change ownership or permissions",
    )
    .conditional(
        r"^find(?:\s|$)",
        &["-delete", "-exec", "-execdir", "-ok", "-okdir", "-fprint", "-fprintf", "-fls"],
        "find without delete-on-match or exec",
    )
    .conditional(r"^sed(?:\s|$)", &["-i", "--in-place"], "sed without in-place edit")
    .conditional(r"^yq(?:\s|$)", &["-i", "--inplace"], "yq without in-place edit")
    .conditional(r"^sort(?:\s|$)", &["-o", "--output"], "sort to stdout")
    .safe(
        r"^(?:ls|cat|head|tail|less|more|grep|egrep|fgrep|rg|ag|wc|echo|printf|pwd|whoami|which|whereis|type|date|uname|hostname|id|df|du|stat|file|tree|jq|uniq|cut|tr|diff|cmp|basename|dirname|realpath|readlink|true|false|sleep|ps|free|uptime|printenv|base64|md5sum|sha1sum|sha256sum|column|nl|fold|comm|seq)(?:\s|$)",
        "read files or system state",
    )
    .build()
}

fn network() -> PolicyResult<DomainTable> {
    TableBuilder::new(
        Domain::Network,
        &["curl", "wget", "ping", "dig", "nslookup", "host", "traceroute"],
    )
    .credentials(CredentialNeed::Never)
    .forbidden(
        r"^curl\s+(?:.*\s)?(?:-x|--request)(?:\s*|=)(?:post|put|patch|delete)(?:\s|$)",
        "non-GET HTTP request",
    )
    .conditional(
        r"^curl(?:\s|$)",
        &[
            "-d",
            "--data",
            "--data-raw",
            "--data-binary",
            "--data-urlencode",
            "--json",
            "-F",
            "--form",
            "-T",
            "--upload-file",
        ],
        "curl without a request body or upload",
    )
    .conditional(
        r"^wget(?:\s|$)",
        &[
            "--post-data",
            "--post-file",
            "--method",
            "--body-data",
            "--body-file",
        ],
        "wget without a request body",
    )
    .safe(
        r"^(?:ping|dig|nslookup|host|traceroute)(?:\s|$)",
        "network diagnostics",
    )
    .build()
}

fn aws() -> PolicyResult<DomainTable> {
    TableBuilder::new(Domain::Aws, &["aws"])
        .strategy(Strategy::Denylist)
        .denylist(
            cmd(
                "aws",
                r"(?:eks\s+delete-cluster|ecs\s+delete-cluster|rds\s+delete-db-cluster|redshift\s+delete-cluster)(?:\s|$)",
            ),
            "delete a cluster",
        )
        .forbidden(
            cmd(
                "aws",
                r"\S+\s+(?:delete|terminate|remove|destroy|deregister|purge|revoke|detach|disassociate|stop|reboot|put|create|update|modify|run|start|attach|associate|authorize|register|reset|restore|import|release|cancel|disable|enable|tag|untag|set|replace|copy|invoke|publish|send|rotate|reject|accept|allocate|batch)[\w-]*(?:\s|$)",
            ),
            "mutating AWS API call",
        )
        .forbidden(
            verbs("aws", r"s3\s+(?:rm|mv|cp|sync|rb|mb|website)"),
            "mutating S3 operation",
        )
        .build()
}

fn gcp() -> PolicyResult<DomainTable> {
    TableBuilder::new(Domain::Gcp, &["gcloud", "gsutil"])
        .strategy(Strategy::Denylist)
        .denylist(
            cmd(
                "gcloud",
                r"(?:\S+\s+)*(?:container\s+clusters|projects)\s+delete(?:\s|$)",
            ),
            "delete a cluster or project",
        )
        .forbidden(
            cmd(
                "gcloud",
                r"(?:\S+\s+)*(?:delete|create|update|patch|set|unset|add-[\w-]+|remove-[\w-]+|reset|stop|start|suspend|resume|resize|deploy|import|export|rollback|disable|enable|undelete|restore|cancel|move|ssh|scp|attach-disk|detach-disk|apply|promote|revoke|grant|insert|replace|execute|call)(?:\s|$)",
            ),
            "mutating gcloud operation",
        )
        .forbidden(
            verbs(
                "gsutil",
                r"rm|mv|cp|rsync|rb|mb|setmeta|retention|(?:acl|defacl|iam)\s+(?:ch|set)|lifecycle\s+set",
            ),
            "mutating storage operation",
        )
        .build()
}

/// Lint, plan and render steps that never write.
pub(super) fn validation_patterns() -> Vec<String> {
    vec![
        verbs("terraform|tofu", "plan|validate|fmt"),
        verbs(
            "terragrunt",
            r"plan|validate|hclfmt|validate-inputs|run-all\s+(?:plan|validate)",
        ),
        verbs("pulumi", "preview"),
        verbs("helm", "lint|template|diff"),
        verbs("helmfile", "lint|template|diff|build"),
        verbs("kubectl|oc", "diff|kustomize"),
        r"^kustomize\s+build(?:\s|$)".to_owned(),
        verbs("flux", "diff|build"),
        verbs("argocd", r"app\s+diff"),
        r"^(?:tflint|tfsec|checkov|trivy|kubeconform|kubeval|kube-linter|conftest|yamllint|shellcheck|hadolint|actionlint)(?:\s|$)".to_owned(),
    ]
}
