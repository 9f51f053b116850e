use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use iocraft::prelude::*;

use civic_board::app::App;
use civic_board::cli::{self, Command};
use civic_board::color::ColorDepth;
use civic_board::config::keybindings::MergedBindings;
use civic_board::config::loader;
use civic_board::engine::{BackendEngine, Engine};
use civic_board::theme::{Background, ResolvedTheme};

#[derive(Parser)]
#[command(
    name = "civic-board",
    version,
    about = "Terminal dashboard for citizen-reported civic issues"
)]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging to debug.log.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() -> Result<()> {
    // Install a panic hook that writes to a file, since the fullscreen TUI
    // swallows stderr.
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("{info}\n\n{backtrace}");
        let _ = std::fs::write("panic.log", &msg);
        eprintln!("{msg}");
    }));

    let cli = Cli::parse();

    if cli.debug {
        let file = std::fs::File::create("debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(file)
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
    }

    let config = loader::load_config(cli.config.as_deref())?;

    // rustls 0.23 needs a process-wide provider before any client is built.
    // A second install (already set) is harmless.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    if let Some(command) = cli.command {
        return cli::run(command, &config);
    }

    let color_depth = ColorDepth::detect();
    let background = Background::detect();
    let theme = ResolvedTheme::resolve(&config.theme, background);
    let keybindings = MergedBindings::from_config(&config.keybindings);

    // The engine runs on its own OS thread with a Tokio runtime. Dropping
    // `engine_handle` at the end of `main` closes its channel and stops it.
    let engine_handle = BackendEngine::new(config.clone()).start();

    tracing::info!("civic-board starting against {}", config.backend.base_url);

    smol::block_on(
        element! {
            App(
                config: &config,
                engine: &engine_handle,
                theme: &theme,
                keybindings: &keybindings,
                color_depth,
            )
        }
        .fullscreen(),
    )?;

    Ok(())
}
