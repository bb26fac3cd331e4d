#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use beaute_business::BusinessConfig;
use beaute_ui::state::State;

mod alloc {
    #[global_allocator]
    static MALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;
}

fn main() -> eframe::Result {
    // Log to stderr (if you run with `RUST_LOG=debug`).
    // egui_winit logs an error for every clipboard read that is not text.
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_module("egui_winit::clipboard", log::LevelFilter::Off)
        .init();

    if let Err(err) = dotenvy::dotenv() {
        log::debug!("no .env loaded: {err}");
    }
    let config = BusinessConfig::from_env().map_err(|err| eframe::Error::AppCreation(Box::new(err)))?;
    log::info!("console api at {}", config.api_url());

    // Commands are spawned on this runtime from the UI thread.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| eframe::Error::AppCreation(Box::new(err)))?;
    let _guard = runtime.enter();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Beaute Console")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Beaute Console",
        native_options,
        Box::new(move |_cc| {
            let state = State::new(config);
            let app = beaute_ui::BeauteApp::new(state);
            Ok(Box::new(app))
        }),
    )
}
