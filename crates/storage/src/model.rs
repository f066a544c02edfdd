use chrono::{DateTime, Utc};
use common::{City, ProductId, PvzId, ReceptionId};
use serde::{Deserialize, Serialize};

/// A registered pickup point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pvz {
    pub id: PvzId,
    pub city: City,
    pub registration_date: DateTime<Utc>,
}

/// Status of a reception batch.
///
/// ```text
/// Open ──close──► Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceptionStatus {
    /// Products may be appended and removed.
    #[serde(rename = "in_progress")]
    Open,

    /// Terminal; the batch is historical.
    #[serde(rename = "close")]
    Closed,
}

impl ReceptionStatus {
    /// Returns the persisted name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionStatus::Open => "in_progress",
            ReceptionStatus::Closed => "close",
        }
    }

    /// Parses a persisted status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(ReceptionStatus::Open),
            "close" => Some(ReceptionStatus::Closed),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ReceptionStatus::Open)
    }
}

impl std::fmt::Display for ReceptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch of incoming goods at a pickup point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reception {
    pub id: ReceptionId,
    pub pvz_id: PvzId,
    pub date_time: DateTime<Utc>,
    pub status: ReceptionStatus,
}

/// A single item logged against a reception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "type")]
    pub product_type: String,
    pub reception_id: ReceptionId,
    pub date_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reception_serializes_wire_field_names() {
        let reception = Reception {
            id: ReceptionId::new(),
            pvz_id: PvzId::new(),
            date_time: Utc::now(),
            status: ReceptionStatus::Open,
        };
        let json = serde_json::to_value(&reception).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["pvzId"], reception.pvz_id.to_string());
        assert!(json.get("dateTime").is_some());
    }

    #[test]
    fn product_type_field_is_named_type() {
        let product = Product {
            id: ProductId::new(),
            product_type: "electronics".to_string(),
            reception_id: ReceptionId::new(),
            date_time: Utc::now(),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["type"], "electronics");
        assert_eq!(json["receptionId"], product.reception_id.to_string());
    }

    #[test]
    fn status_names_match_persisted_form() {
        for status in [ReceptionStatus::Open, ReceptionStatus::Closed] {
            assert_eq!(ReceptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReceptionStatus::parse("open"), None);
    }
}
