//! `/users` endpoints.

use crate::api::{ApiClient, PaginatedResponse};
use crate::api_error::ApiError;
use crate::http::Method;
use crate::table::ServerTableFilters;

use super::model::{BulkIdsRequest, BulkStatusRequest, User, UserStatus};

pub const BASE_PATH: &str = "/users";

/// GET `/users?page=&limit=&search=&sort=&order=&...`
pub async fn list(
    client: &ApiClient,
    filters: &ServerTableFilters,
) -> Result<PaginatedResponse<User>, ApiError> {
    client.get(BASE_PATH, filters.to_query()).await
}

/// DELETE `/users/{id}`
pub async fn delete(client: &ApiClient, id: u64) -> Result<(), ApiError> {
    client.delete(&format!("{BASE_PATH}/{id}"), None::<&()>).await
}

/// POST `/users/bulk-delete` with `{ids}`
pub async fn bulk_delete(client: &ApiClient, ids: &[u64]) -> Result<(), ApiError> {
    let body = BulkIdsRequest { ids: ids.to_vec() };
    client
        .send(Method::Post, &format!("{BASE_PATH}/bulk-delete"), &body)
        .await
}

/// PATCH `/users/bulk-status` with `{ids, status}`
pub async fn bulk_update_status(
    client: &ApiClient,
    ids: &[u64],
    status: UserStatus,
) -> Result<(), ApiError> {
    let body = BulkStatusRequest {
        ids: ids.to_vec(),
        status,
    };
    client
        .send(Method::Patch, &format!("{BASE_PATH}/bulk-status"), &body)
        .await
}
