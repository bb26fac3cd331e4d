//! `/v2/roles` and `/permissions` endpoints.

use crate::api::{ApiClient, ApiResponse, PaginatedResponse};
use crate::api_error::ApiError;

use super::model::{
    CreateRoleRequest, DuplicateRoleRequest, Permission, Role, RoleFilters, RoleStatus,
    RoleStatusRequest, UpdateRoleRequest,
};

pub const BASE_PATH: &str = "/v2/roles";

fn no_query() -> Vec<(String, String)> {
    Vec::new()
}

pub async fn list(
    client: &ApiClient,
    filters: &RoleFilters,
) -> Result<PaginatedResponse<Role>, ApiError> {
    client.get(BASE_PATH, filters.to_query()).await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<Role, ApiError> {
    let response: ApiResponse<Role> = client.get(&format!("{BASE_PATH}/{id}"), no_query()).await?;
    Ok(response.data)
}

pub async fn create(client: &ApiClient, request: &CreateRoleRequest) -> Result<Role, ApiError> {
    let response: ApiResponse<Role> = client.post(BASE_PATH, request).await?;
    Ok(response.data)
}

/// PUT `/v2/roles/{id}` with every field except the id.
pub async fn update(client: &ApiClient, request: &UpdateRoleRequest) -> Result<Role, ApiError> {
    let response: ApiResponse<Role> = client
        .put(&format!("{BASE_PATH}/{}", request.id), request)
        .await?;
    Ok(response.data)
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("{BASE_PATH}/{id}"), None::<&()>).await
}

/// PATCH `/v2/roles/{id}/status` with `{status: "active" | "inactive"}`
pub async fn update_status(
    client: &ApiClient,
    id: &str,
    status: RoleStatus,
) -> Result<Role, ApiError> {
    let response: ApiResponse<Role> = client
        .patch(&format!("{BASE_PATH}/{id}/status"), &RoleStatusRequest { status })
        .await?;
    Ok(response.data)
}

/// POST `/v2/roles/{id}/duplicate` with the copy's name.
pub async fn duplicate(client: &ApiClient, id: &str, name: &str) -> Result<Role, ApiError> {
    let body = DuplicateRoleRequest {
        name: name.to_owned(),
    };
    let response: ApiResponse<Role> = client
        .post(&format!("{BASE_PATH}/{id}/duplicate"), &body)
        .await?;
    Ok(response.data)
}

pub async fn permissions(client: &ApiClient) -> Result<Vec<Permission>, ApiError> {
    let response: ApiResponse<Vec<Permission>> = client.get("/permissions", no_query()).await?;
    Ok(response.data)
}
