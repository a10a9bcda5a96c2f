//! # legend_dashboard
//!
//! Part of the legend_dashboard crate family.
//!
//! This is the native viewer of the L200 monitoring dashboard using [egui](https://github.com/emilk/egui).
//!
//! ## Install
//!
//! Use `cargo install --path ./legend_dashboard`
//!
//! ## Use
//!
//! ```bash
//! legend_dashboard [config.yaml]
//! ```
//!
//! If no configuration is given, open one using File->Open. The physics monitoring page
//! shows the selectors above the plot; the Information page gives an overview of them.
//! Logs are written to `legend_dashboard.log` in the working directory.

mod app;
mod plot;
use app::DashboardApp;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;

fn setup_logging() -> Result<(), spdlog::Error> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from("./legend_dashboard.log"))
            .formatter(spdlog::formatter::PatternFormatter::new(
                spdlog::formatter::pattern!(
                    "[{date_short} {time_short}] - [{^{level}}] - {payload}{eol}"
                ),
            ))
            .truncate(true)
            .build()?,
    );
    let logger = Arc::new(
        spdlog::Logger::builder()
            .flush_level_filter(spdlog::LevelFilter::All)
            .level_filter(spdlog::LevelFilter::MoreSevereEqual(spdlog::Level::Debug))
            .sink(file_sink)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    Ok(())
}

/// The program entry point
fn main() {
    let matches = Command::new("legend_dashboard")
        .about("Native viewer of the L200 monitoring dashboard")
        .arg(Arg::new("config_file").help("Path to the dashboard configuration"))
        .get_matches();
    let config_path = matches.get_one::<String>("config_file").map(PathBuf::from);

    if let Err(e) = setup_logging() {
        eprintln!("Could not create the log file, logging to the terminal: {e}");
    }
    spdlog::info!("Starting L200 Monitoring Dashboard UI");

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("L200 Monitoring Dashboard")
            .with_inner_size(eframe::epaint::vec2(1280.0, 900.0))
            .with_min_inner_size(eframe::epaint::vec2(800.0, 600.0)),
        ..Default::default()
    };
    match eframe::run_native(
        "legend_dashboard",
        native_options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config_path.as_deref())))),
    ) {
        Ok(()) => (),
        Err(e) => spdlog::error!("Eframe error: {}", e),
    }
}
