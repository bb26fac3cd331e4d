//! Pages shown in the central panel, one per [`beaute_business::Route`]:
//! - `login`: sign-in form while there is no session
//! - `users` / `roles`: the console tables
//! - `screens`: maintenance and error screens

mod login;
mod roles;
mod screens;
mod users;

pub use login::login_page;
pub use roles::roles_page;
pub use screens::status_screen;
pub use users::users_page;
