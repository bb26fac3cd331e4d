//! egui front-end of the beauty console: the data-table renderer, the console pages
//! and the [`BeauteApp`] frame loop over a [`beaute_states::StateCtx`].

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod pages;
pub mod state;
pub mod utils;
pub mod widgets;

pub use app::BeauteApp;
