use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::table::{RowId, RowKey, SortOrder};

/// Wire form of a role's `status` flag in requests and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleStatus {
    Active,
    Inactive,
}

impl RoleStatus {
    pub fn from_active(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub status: bool,
    #[serde(default)]
    pub users_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Role {
    pub fn status_label(&self) -> &'static str {
        if self.status { "Active" } else { "Inactive" }
    }

    /// Name suggested for a copy of this role.
    pub fn duplicate_name(&self) -> String {
        format!("{} (Copy)", self.name)
    }
}

impl RowKey for Role {
    fn row_key(&self) -> Option<RowId> {
        Some(RowId::new(&self.id))
    }
}

/// Query of `GET /v2/roles`. Unset and blank values are left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleFilters {
    pub search: Option<String>,
    pub status: Option<RoleStatus>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

impl RoleFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let date = |value: Option<NaiveDate>| value.map(|d| d.format("%Y-%m-%d").to_string());
        let pairs = [
            ("search", self.search.as_ref().map(|s| s.trim().to_owned())),
            ("status", self.status.map(|s| s.as_str().to_owned())),
            ("created_from", date(self.created_from)),
            ("created_to", date(self.created_to)),
            ("page", self.page.map(|p| p.to_string())),
            ("limit", self.limit.map(|l| l.to_string())),
            ("sort", self.sort.as_ref().map(|s| s.trim().to_owned())),
            ("order", self.order.map(|o| o.as_str().to_owned())),
        ];
        pairs
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .filter(|value| !value.is_empty())
                    .map(|value| (key.to_owned(), value))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permission_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RoleStatus>,
}

/// Partial update; `id` goes in the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateRoleRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RoleStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RoleStatusRequest {
    pub status: RoleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DuplicateRoleRequest {
    pub name: String,
}
