//! # legend_dashboard_cli
//!
//! Part of the legend_dashboard crate family.
//!
//! Serves the L200 monitoring dashboard over HTTP. Plots are rendered on the server as SVG.
//!
//! ## Use
//!
//! ```bash
//! legend_dashboard_cli <config.yaml> [-p 9000] [-w 140] [-d <page>...]
//! ```
//!
//! - `-p/--port`: the port to serve on
//! - `-w/--widget-widths`: width of the selector widgets in pixels
//! - `-d/--disable-page`: pages to leave out, any of `phy` and `info`
//!
//! `legend_dashboard_cli new <config.yaml>` writes a template configuration.
//!
//! Routes: `/` (physics monitoring, selection in the query string, e.g.
//! `/?period=p03&run=r000&plot_value=Noise&resampled=10`), `/plot.svg`, `/api/figure` and
//! `/info`.
mod html;
mod server;
mod svg;

use clap::{value_parser, Arg, ArgAction, Command};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use liblegend_dashboard::config::Config;
use liblegend_dashboard::monitor::PhyMonitor;
use liblegend_dashboard::view::{enabled_pages, DEFAULT_WIDGET_WIDTH};
use server::DashboardState;

const DEFAULT_PORT: u16 = 9000;
const DEFAULT_PORT_STR: &str = "9000";
const DEFAULT_WIDGET_WIDTH_STR: &str = "140";

fn make_template_config(path: &Path) -> std::io::Result<()> {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut file = File::create(path)?;
    file.write_all(yaml_str.as_bytes())
}

fn cli() -> Command {
    Command::new("legend_dashboard_cli")
        .about("Serve the L200 monitoring dashboard")
        .arg_required_else_help(true)
        .subcommand_negates_reqs(true)
        .subcommand(
            Command::new("new")
                .about("Make a template configuration yaml file")
                .arg(Arg::new("path").required(true).help("Path to the template")),
        )
        .arg(
            Arg::new("config_file")
                .required(true)
                .help("Path to the dashboard configuration"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_parser(value_parser!(u16))
                .default_value(DEFAULT_PORT_STR)
                .help("Port to serve on"),
        )
        .arg(
            Arg::new("widget_widths")
                .short('w')
                .long("widget-widths")
                .value_parser(value_parser!(u32))
                .default_value(DEFAULT_WIDGET_WIDTH_STR)
                .help("Width of the selector widgets"),
        )
        .arg(
            Arg::new("disable_page")
                .short('d')
                .long("disable-page")
                .num_args(0..)
                .action(ArgAction::Append)
                .help("Pages to disable (phy, info)"),
        )
}

fn main() {
    let matches = cli().get_matches();

    // Initialize feedback
    if let Err(e) = simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("Could not create logging: {e}");
    }

    if let Some(("new", sub)) = matches.subcommand() {
        let Some(path) = sub.get_one::<String>("path").map(PathBuf::from) else {
            return;
        };
        log::info!("Making a template config at {}...", path.to_string_lossy());
        match make_template_config(&path) {
            Ok(()) => log::info!("Done."),
            Err(e) => log::error!("Could not write template config: {e}"),
        }
        return;
    }

    let Some(config_path) = matches.get_one::<String>("config_file").map(PathBuf::from) else {
        return;
    };
    let port = matches
        .get_one::<u16>("port")
        .copied()
        .unwrap_or(DEFAULT_PORT);
    let widget_width = matches
        .get_one::<u32>("widget_widths")
        .copied()
        .unwrap_or(DEFAULT_WIDGET_WIDTH);
    let disabled: Vec<String> = matches
        .get_many::<String>("disable_page")
        .map(|pages| pages.cloned().collect())
        .unwrap_or_default();

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Phy Path: {}", config.phy.to_string_lossy());
    log::info!("Run info: {}", config.run_info_path().to_string_lossy());
    log::info!("Channel map: {}", config.channel_map_path().to_string_lossy());

    let monitor = match PhyMonitor::new(config) {
        Ok(m) => m,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let pages = enabled_pages(disabled.as_slice());
    if pages.is_empty() {
        log::warn!("All pages are disabled");
    }
    let state = DashboardState {
        monitor: Arc::new(monitor),
        pages: Arc::new(pages),
        widget_width,
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Could not start the runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(server::serve(state, port)) {
        log::error!("Server failed: {e}");
        std::process::exit(1);
    }
}
