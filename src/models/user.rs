//! User account model.

use serde::{Deserialize, Serialize};

use super::loose;

/// An operator account of the ERP.
///
/// Accounts are managed by the authentication layer; this crate only
/// persists them and references them from the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Storage identifier.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Role label (admin, accountant, viewer, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Account status label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
