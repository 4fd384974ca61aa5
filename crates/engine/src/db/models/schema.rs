//! Schema row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Publication status of a schema, stored as a small integer.
/// Only active schemas are executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaStatus {
    Draft,
    Active,
    Archived,
}

impl SchemaStatus {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Draft),
            2 => Some(Self::Active),
            3 => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Draft => 1,
            Self::Active => 2,
            Self::Archived => 3,
        }
    }
}

/// A persistent workflow definition.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Schema {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Graph JSON: `{nodes: [...], edges: [...]}`.
    pub definition: serde_json::Value,
    pub id_status: i16,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schema {
    pub fn is_active(&self) -> bool {
        SchemaStatus::from_i16(self.id_status) == Some(SchemaStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [SchemaStatus::Draft, SchemaStatus::Active, SchemaStatus::Archived] {
            assert_eq!(SchemaStatus::from_i16(status.as_i16()), Some(status));
        }
    }
}
