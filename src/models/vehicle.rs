//! Vehicle model.

use serde::{Deserialize, Serialize};

use super::{RegistrationNo, loose};

/// A tracked vehicle billed to a client.
///
/// Ownership is expressed through `client_name`, matching the client's
/// display name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Storage identifier.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Registration plate, the natural key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_no: Option<RegistrationNo>,
    /// Owning client's display name.
    #[serde(default)]
    pub client_name: String,
    /// Vehicle category (truck, saloon, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Monthly tracking fee.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub monthly_rate: Option<f64>,
    /// Per-unit rate used by older records instead of `monthly_rate`.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub unit_rate: Option<f64>,
    /// Free-form status label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Vehicle {
    /// Returns the billed monthly rate, falling back to the unit rate.
    #[inline]
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.monthly_rate.or(self.unit_rate).unwrap_or(0.0_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_falls_back_to_unit_rate() {
        let vehicle: Vehicle =
            serde_json::from_str(r#"{"registrationNo": "KDA 001A", "unitRate": 1800}"#).unwrap();
        assert!((vehicle.rate() - 1800.0).abs() < f64::EPSILON);
        assert_eq!(
            vehicle.registration_no,
            Some(RegistrationNo::from("KDA 001A"))
        );
    }
}
