//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `octave_core` linkage and that the configured store opens.
//! - Keep output deterministic for quick local sanity checks.

use log::info;
use octave_core::db::migrations::latest_version;
use octave_core::{auth_gate, AppConfig, LocalIdentityProvider, OctaveApp};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("octave config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = config.init_logging() {
        eprintln!("octave logging error: {err}");
        return ExitCode::FAILURE;
    }

    println!("octave_core ping={}", octave_core::ping());
    println!("octave_core version={}", octave_core::core_version());
    println!("octave_core schema_version={}", latest_version());

    let app = match OctaveApp::open(&config, Arc::new(LocalIdentityProvider::new())) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("octave store error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = app.start() {
        eprintln!("octave session error: {err}");
        return ExitCode::FAILURE;
    }

    let store_mode = if config.db_path.is_some() { "file" } else { "memory" };
    println!("octave_core store={store_mode}");
    println!("octave_core gate={:?}", auth_gate(&app.session().state()));
    info!("event=cli_smoke module=cli status=ok store={store_mode}");

    app.shutdown();
    ExitCode::SUCCESS
}
