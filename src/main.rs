//! Binaural CLI
//!
//! Command-line interface for the binaural beat generator.

use std::io;
use std::process;

use clap::Parser;
use env_logger::Env;
use log::info;

use binaural::cli::commands::{self, describe_error};
use binaural::cli::session::Session;
use binaural::cli::{Cli, Commands};
use binaural::config::Settings;
use binaural::engine::preview::CpalDevice;
use binaural::Result;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Binaural Generator v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run(cli) {
        eprintln!("{}", describe_error(&err));
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Some(cmd) => handle_command(&settings, cmd),
        None => {
            let mut session = Session::new(
                settings.form(),
                settings.exporter(),
                settings.synthesizer(),
                CpalDevice,
            );
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            session
                .run(stdin.lock(), &mut stdout)
                .map_err(|source| binaural::BinauralError::Io {
                    path: "<stdio>".into(),
                    source,
                })
        }
    }
}

fn handle_command(settings: &Settings, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Generate(args) => commands::generate(settings, &args).map(|_| ()),
        Commands::Preview(args) => commands::preview(settings, &args),
        Commands::Beat { left, right } => {
            commands::beat(settings, left.as_deref(), right.as_deref())
        }
    }
}
