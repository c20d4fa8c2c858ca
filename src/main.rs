mod app;

use eframe::egui;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use winpanel::config::{Config, LoggingConfig};
use winpanel::probe::LocalFs;
use winpanel::session::Session;
use winpanel::shell::SystemShell;

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> eframe::Result<()> {
    let path = Config::default_path();
    let loaded = match &path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    };

    let filter = match &loaded {
        Ok(config) => config.logging.filter.clone(),
        Err(_) => LoggingConfig::default().filter,
    };
    init_logging(&filter);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, code = e.code(), "configuration rejected, using defaults");
            Config::default()
        }
    };
    info!(windows_dir = %config.paths.windows_dir.display(), "starting");

    let session = Session::new(&config, Box::new(SystemShell), Box::new(LocalFs));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("WinPanel")
            .with_inner_size([760.0, 560.0])
            .with_min_inner_size([560.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "WinPanel",
        options,
        Box::new(move |cc| Ok(Box::new(app::WinPanelApp::new(cc, session, &config)))),
    )
}
