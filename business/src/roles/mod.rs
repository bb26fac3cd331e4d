//! Roles domain: model, `/v2/roles` endpoints, column provider, commands and page state.

pub mod api;
mod columns;
mod commands;
mod model;
mod page;

pub use columns::{roles_columns, roles_initial_state, roles_toolbar};
pub use commands::{
    DeleteRoleCommand, DuplicateRoleCommand, FetchRolesCommand, RoleMutation,
    RoleMutationRequest, RoleMutationResult, RolesQuery, ToggleRoleStatusCommand,
};
pub use model::{
    CreateRoleRequest, Permission, Role, RoleFilters, RoleStatus, UpdateRoleRequest,
};
pub use page::RolesPage;
