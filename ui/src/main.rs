use crate::app::App;

use backend::Config;
use eframe::egui::ViewportBuilder;
use tracing_subscriber::EnvFilter;

mod app;
mod error;
mod input;

pub(crate) type Result<T> = std::result::Result<T, crate::error::Error>;

const MIN_SIZE: [f32; 2] = [650.0, 540.0];
const INITIAL_SIZE: [f32; 2] = [960.0, 540.0];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::locate()?;

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("Servo Control with Webcam and Gamepad")
            .with_inner_size(INITIAL_SIZE)
            .with_min_inner_size(MIN_SIZE),
        ..Default::default()
    };

    eframe::run_native(
        "Mini-Turret",
        options,
        Box::new(move |cc| Box::new(App::new(cc, config))),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))
}
