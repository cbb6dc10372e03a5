//! barvisor: status line for i3bar/swaybar.
//!
//! # Configuration
//!
//! The first of these is used:
//!
//! 1. `--config <FILE>`
//! 2. `$XDG_CONFIG_HOME/barvisor/barvisor.yml` (`~/.config/...` when unset)
//! 3. `./barvisor.yml`
//! 4. the builtin configuration
//!
//! Logs go to stderr; stdout carries the bar protocol. `RUST_LOG` overrides
//! the default `info` filter unless `--debug` is given.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use barvisor::{install_panic_hook, Config, RuntimeError, SupervisorBuilder};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Supervised status line for i3bar and swaybar
#[derive(Parser, Debug)]
#[command(name = "barvisor")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file (default: barvisor.yml in the config directory or the current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Seconds each widget gets to shut down (overrides the config file)
    #[arg(long, value_name = "SECS")]
    shutdown_timeout: Option<u64>,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.debug);
    install_panic_hook();

    let mut cfg = match Config::discover(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, label = e.as_label(), "failed to load config");
            Config::failed(&e)
        }
    };
    if let Some(secs) = args.shutdown_timeout {
        cfg.supervisor.shutdown_timeout = Duration::from_secs(secs);
    }

    if cfg.has_labels() {
        warn!("widget workspaces are set but no label source is attached; positive labels never match");
    }

    let sup = SupervisorBuilder::new(cfg.supervisor)
        .with_specs(cfg.widgets)
        .build();

    match sup.run().await {
        Ok(()) => {}
        Err(e @ RuntimeError::ShutdownTimedOut { .. }) => {
            warn!(error = %e, label = e.as_label(), "shutdown incomplete");
        }
        Err(e) => {
            error!(error = %e, label = e.as_label(), "status line failed");
            return ExitCode::FAILURE;
        }
    }
    info!("exit");
    ExitCode::SUCCESS
}
