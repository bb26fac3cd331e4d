use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::table::{RowId, RowKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RowKey for User {
    fn row_key(&self) -> Option<RowId> {
        Some(RowId::from(self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkIdsRequest {
    pub ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<u64>,
    pub status: UserStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_tolerates_missing_optional_fields() {
        let user: User = serde_json::from_str(
            r#"{"id":3,"username":"student_mary","name":"Mary Johnson","email":"mary@example.com","status":"inactive"}"#,
        )
        .unwrap();
        assert_eq!(user.status, UserStatus::Inactive);
        assert_eq!(user.phone, None);
        assert_eq!(user.created_at, None);
        assert_eq!(user.row_key(), Some(RowId::from(3)));
    }

    #[test]
    fn bulk_status_serialises_lowercase() {
        let body = serde_json::to_value(BulkStatusRequest {
            ids: vec![1, 2],
            status: UserStatus::Inactive,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"ids": [1, 2], "status": "inactive"}));
    }
}
