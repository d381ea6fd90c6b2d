//! Client model.

use serde::{Deserialize, Serialize};

use super::loose;

/// Whether a client is currently billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClientStatus {
    /// Client is billed every cycle.
    #[default]
    Active,
    /// Client is kept for history only.
    Inactive,
}

/// A customer of the vehicle-tracking service.
///
/// `balance` is a cached display value only; the authoritative balance is
/// derived from the client ledger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Storage identifier.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Business identifier, preferred identity key.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Display name, also used by vehicles and invoices to reference the client.
    #[serde(default)]
    pub name: String,
    /// Contact e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Default monthly price per tracked unit.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub default_unit_price: Option<f64>,
    /// Billing status.
    #[serde(default)]
    pub status: ClientStatus,
    /// Cached balance for display.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_browser_client() {
        let json = r#"{
            "id": 17,
            "clientId": "CL-017",
            "name": "Acme Logistics",
            "email": "ops@acme.test",
            "phone": 254700000000,
            "defaultUnitPrice": "2500",
            "status": "Inactive",
            "someLegacyField": true
        }"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.id.as_deref(), Some("17"));
        assert_eq!(client.client_id.as_deref(), Some("CL-017"));
        assert_eq!(client.phone.as_deref(), Some("254700000000"));
        assert_eq!(client.default_unit_price, Some(2500.0));
        assert_eq!(client.status, ClientStatus::Inactive);
        assert!(client.balance.is_none());
    }

    #[test]
    fn status_defaults_to_active() {
        let client: Client = serde_json::from_str(r#"{"name": "Solo"}"#).unwrap();
        assert_eq!(client.status, ClientStatus::Active);
    }
}
