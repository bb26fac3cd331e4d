pub mod data_table;
pub mod dialogs;
pub mod floating_bar;
pub mod pagination;
pub mod toasts;
pub mod toolbar;

pub use data_table::{TableEvent, data_table};
pub use dialogs::{
    DialogAction, bulk_delete_dialog, delete_confirm_dialog, detail_window, role_delete_dialog,
};
pub use floating_bar::{FloatingBarEvent, floating_bar};
pub use pagination::pagination_footer;
pub use toasts::Toasts;
pub use toolbar::table_toolbar;
