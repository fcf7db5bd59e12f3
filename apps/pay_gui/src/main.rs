use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use payment_core::config;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::app::PaymentApp;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./payment.toml or the user config dir.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => config::load_settings_from(Some(path)),
        None => config::load_settings(),
    };
    tracing::info!(
        horizon = %settings.horizon_url,
        network = settings.network_label(),
        "starting payment gui"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Stellar Payment")
            .with_inner_size([520.0, 640.0])
            .with_min_inner_size([420.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Stellar Payment",
        options,
        Box::new(move |_cc| Ok(Box::new(PaymentApp::new(cmd_tx, ui_rx)))),
    )
}
