//! Users domain: model, `/users` endpoints, column provider, commands and page state.

pub mod api;
mod columns;
mod commands;
mod model;
mod page;

pub use columns::{users_columns, users_filter_fields, users_initial_filters};
pub use commands::{
    BulkDeleteUsersCommand, BulkUpdateUserStatusCommand, DeleteUserCommand,
    FetchUsersPageCommand, UserMutation, UserMutationRequest, UserMutationResult, UsersQuery,
};
pub use model::{BulkIdsRequest, BulkStatusRequest, User, UserStatus};
pub use page::UsersPage;
