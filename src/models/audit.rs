//! Audit trail entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::loose;

/// Kind of mutation recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    /// A record was created.
    Create,
    /// A record was modified.
    Update,
    /// A record was removed.
    Delete,
}

impl core::fmt::Display for AuditAction {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match *self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: String,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub action: AuditAction,
    /// Affected record type (e.g. `"payment"`, `"user"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Affected user account, for user management actions.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<String>,
    /// Affected user's login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_username: Option<String>,
    /// Operator who performed the action.
    pub performed_by: String,
    /// Operator's role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by_role: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AuditEntry {
    /// Creates an entry stamped with a fresh identifier and the current time.
    #[inline]
    #[must_use]
    pub fn new<K: Into<String>, P: Into<String>>(action: AuditAction, kind: K, performed_by: P) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            kind: kind.into(),
            target_user_id: None,
            target_username: None,
            performed_by: performed_by.into(),
            performed_by_role: None,
            details: None,
        }
    }

    /// Sets the affected user account.
    #[inline]
    #[must_use]
    pub fn target<I: Into<String>, U: Into<String>>(mut self, user_id: I, username: U) -> Self {
        self.target_user_id = Some(user_id.into());
        self.target_username = Some(username.into());
        self
    }

    /// Sets the operator's role.
    #[inline]
    #[must_use]
    pub fn role<R: Into<String>>(mut self, role: R) -> Self {
        self.performed_by_role = Some(role.into());
        self
    }

    /// Sets the free-form description.
    #[inline]
    #[must_use]
    pub fn details<T: Into<String>>(mut self, details: T) -> Self {
        self.details = Some(details.into());
        self
    }
}
