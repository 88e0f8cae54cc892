#![windows_subsystem = "windows"]

use anyhow::Result;
use bankroll_desk::{config::Config, gui};
use tracing_subscriber;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    gui::launch(config)?;

    Ok(())
}
