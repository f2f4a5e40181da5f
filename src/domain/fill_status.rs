//! Cache-fill status as reported by a cache backend.

use serde::{Deserialize, Serialize};

/// Observed state of a background cache fill for one URL.
///
/// The orchestrator only reads this value; the fill itself runs elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillStatus {
    /// A stored copy exists at `world_address`.
    Present { world_address: String },
    /// The last population attempt failed.
    Error { reason: String },
    /// Population has not finished yet.
    Pending,
}

/// Serialized form kept by fill status stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StoredStatus {
    Pending,
    Present { world_address: String },
    Error { reason: String },
}

impl From<StoredStatus> for FillStatus {
    fn from(stored: StoredStatus) -> Self {
        match stored {
            StoredStatus::Pending => FillStatus::Pending,
            StoredStatus::Present { world_address } => FillStatus::Present { world_address },
            StoredStatus::Error { reason } => FillStatus::Error { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_status_converts_to_fill_status() {
        assert_eq!(FillStatus::from(StoredStatus::Pending), FillStatus::Pending);
        assert_eq!(
            FillStatus::from(StoredStatus::Error {
                reason: "boom".to_string()
            }),
            FillStatus::Error {
                reason: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_stored_status_json_shape() {
        let json = serde_json::to_value(StoredStatus::Present {
            world_address: "https://cdn.example.com/a".to_string(),
        })
        .unwrap();
        assert_eq!(json["state"], "present");
        assert_eq!(json["world_address"], "https://cdn.example.com/a");

        let parsed: StoredStatus = serde_json::from_str(r#"{"state":"pending"}"#).unwrap();
        assert_eq!(FillStatus::from(parsed), FillStatus::Pending);
    }
}
