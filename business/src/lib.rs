//! Business layer of the beauty console: remote data, session, query cache, the generic
//! data table and the users/roles screens, all as states and commands of a
//! [`beaute_states::StateCtx`]. Nothing here draws; `beaute-ui` renders these states.

pub mod api;
mod api_error;
pub mod auth;
mod config;
pub mod dialogs;
pub mod http;
pub mod list_query;
mod maintenance;
mod notifications;
pub mod query_cache;
pub mod roles;
mod route;
pub mod table;
pub mod users;

pub use api::{ApiClient, ApiResponse, PageMeta, PaginatedResponse};
pub use api_error::{ApiError, ApiErrorKind, FieldErrors};
pub use auth::{AuthSession, MemoryTokenStore, TokenStore};
pub use config::{BusinessConfig, ConfigError};
pub use maintenance::{MAINTENANCE_PATH, MaintenanceGate};
pub use notifications::{Notification, NotificationLevel, Notifications};
pub use query_cache::{QueryCache, QueryKey, RetryPolicy};
pub use route::Route;
