//! Approval gate settings.

use serde::{Deserialize, Serialize};

use crate::error::{ApprovalError, ApprovalResult};

/// Canonical responses and display caps for the approval gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSettings {
    /// The only response that approves a change set.
    pub approve_token: String,
    /// The only response that rejects a change set.
    pub reject_token: String,
    /// Files listed before collapsing the rest into a `+N more` line.
    pub max_files_shown: usize,
    /// Resources listed per kind before collapsing the rest.
    pub max_resources_per_group: usize,
}

impl Default for ApprovalSettings {
    fn default() -> Self {
        Self {
            approve_token: "approve".to_owned(),
            reject_token: "reject".to_owned(),
            max_files_shown: 10,
            max_resources_per_group: 5,
        }
    }
}

impl ApprovalSettings {
    /// Check the tokens and caps.
    ///
    /// # Errors
    ///
    /// Returns an error if a token is blank or padded with whitespace, if the
    /// two tokens are equal, or if a display cap is zero.
    pub fn validate(&self) -> ApprovalResult<()> {
        for (name, token) in [
            ("approve", &self.approve_token),
            ("reject", &self.reject_token),
        ] {
            if token.trim().is_empty() {
                return Err(ApprovalError::InvalidToken {
                    reason: format!("{name} token is empty"),
                });
            }
            if token.trim() != token {
                return Err(ApprovalError::InvalidToken {
                    reason: format!("{name} token has surrounding whitespace"),
                });
            }
        }
        if self.approve_token == self.reject_token {
            return Err(ApprovalError::InvalidToken {
                reason: "approve and reject tokens are identical".to_owned(),
            });
        }
        if self.max_files_shown == 0 {
            return Err(ApprovalError::InvalidLimit {
                name: "max_files_shown",
            });
        }
        if self.max_resources_per_group == 0 {
            return Err(ApprovalError::InvalidLimit {
                name: "max_resources_per_group",
            });
        }
        Ok(())
    }
}
