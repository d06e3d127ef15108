#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names
)]

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en");

use anyhow::{Context, Result};
use clap::Parser;
use screen_guard::Config;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod app;
mod cli;

use cli::commands::Cli;

/// `SCREEN_GUARD_LOG` wins over `--verbose`; unparsable values fall back.
fn log_level(verbose: bool) -> Level {
    std::env::var("SCREEN_GUARD_LOG")
        .ok()
        .and_then(|raw| raw.trim().parse::<Level>().ok())
        .unwrap_or(if verbose { Level::DEBUG } else { Level::INFO })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = Config::load_or_init()?;
    config.apply_locale();
    app::dispatch::dispatch(cli, config)
}
