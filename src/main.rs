//! WebGIS Map Interaction Runner.
//!
//! Spielt ein Interaktions-Szenario (JSON) gegen die In-Memory-Engine ab und
//! gibt jedes veröffentlichte Event als JSON-Zeile auf stdout aus. Ohne
//! Argument läuft das eingebaute Demo-Szenario.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use webgis_map_interaction::{InteractionController, InteractionOptions, Scenario};

fn main() -> anyhow::Result<()> {
    AppRunner::run()
}

struct AppRunner;

impl AppRunner {
    fn run() -> anyhow::Result<()> {
        // Logger initialisieren
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();

        log::info!(
            "WebGIS Map Interaction v{} startet...",
            env!("CARGO_PKG_VERSION")
        );

        // Optionen aus TOML laden (oder Standardwerte)
        let config_path = InteractionOptions::config_path();
        let options = InteractionOptions::load_from_file(&config_path);

        let scenario = match std::env::args_os().nth(1).map(PathBuf::from) {
            Some(path) => Scenario::load_from_file(&path)?,
            None => Scenario::demo()?,
        };

        let mut controller = InteractionController::new(options);
        let events = controller.run(scenario);
        controller.manager_mut().dispose();
        let teardown = controller.take_events();

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for event in events.iter().chain(teardown.iter()) {
            let line = serde_json::to_string(event).context("Event nicht serialisierbar")?;
            writeln!(out, "{line}")?;
        }

        log::info!("{} Events ausgegeben", events.len() + teardown.len());
        Ok(())
    }
}
