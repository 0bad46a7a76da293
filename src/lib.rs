//! VolunteerHub library root.
//! Exposes the CLI parser, the high-level run() function and the internal
//! modules (core logic, record store, export, mail outbox).

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod mail;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::commands;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => commands::init::handle(cli),
        Commands::Config { .. } => commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => commands::log::handle(&cli.command, cfg),
        Commands::User { .. } => commands::user::handle(cli, cfg),
        Commands::Checkin { .. } | Commands::Checkout { .. } => {
            commands::checkin::handle(cli, cfg)
        }
        Commands::Active => commands::active::handle(cfg),
        Commands::Donate { .. } => commands::donate::handle(cli, cfg),
        Commands::Session { .. } => commands::session::handle(cli, cfg),
        Commands::AutoCheckout { .. } => commands::auto_checkout::handle(cli, cfg),
        Commands::Stats { .. } => commands::stats::handle(cli, cfg),
        Commands::Export { .. } => commands::export::handle(cli, cfg),
        Commands::Waiver { .. } => commands::waiver::handle(cli, cfg),
        Commands::Staff { .. } => commands::staff::handle(cli, cfg),
        Commands::Outbox => commands::outbox::handle(cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // `init` rewrites the file, so a broken one must not block it
    let mut cfg = match (&cli.command, Config::load()) {
        (_, Ok(cfg)) => cfg,
        (Commands::Init, Err(e)) => {
            tracing::warn!(error = %e, "ignoring unreadable config during init");
            Config::default()
        }
        (_, Err(e)) => return Err(e),
    };

    if let Some(custom_db) = &cli.db {
        cfg.database = utils::path::expand_tilde(custom_db)
            .to_string_lossy()
            .to_string();
    }
    tracing::debug!(database = %cfg.database, "configuration loaded");

    dispatch(&cli, &cfg)
}
