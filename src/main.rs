mod calibration;
mod components;
mod config;
mod error;
mod export;
mod geo;
mod missions;
mod model;
mod render;
mod session;
mod state;
mod storage;
mod util;

use components::app::App;

fn main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
    log::info!("fog-explorer {}", env!("CARGO_PKG_VERSION"));
    yew::Renderer::<App>::new().render();
}
