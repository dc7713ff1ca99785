//! Entry point for the **vim-fifo** daemon.
//!
//! Starts a [`FifoServer`](vim_fifo::server::FifoServer) on the configured
//! pipe and parks the main thread until SIGTERM, SIGINT, SIGQUIT or SIGHUP
//! arrives, then stops the server, which removes the pipe.
//!
//! ```text
//! vim-fifo [--config <path>] [--fifo <path>] [--dry-run]
//! ```
//!
//! With `--dry-run` instructions are logged instead of being sent to Vim.

use log::{error, info};
use std::path::PathBuf;
use vim_fifo::config::{config_dir, Config};
use vim_fifo::executor::vim::VimRemote;
use vim_fifo::executor::LogExecutor;
use vim_fifo::server::FifoServer;
use vim_fifo::shutdown::ShutdownSignals;
use vim_fifo::traits::CommandExecutor;

/// Command-line options.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    fifo: Option<String>,
    dry_run: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let value = it.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(value));
            }
            "--fifo" => {
                args.fifo = Some(it.next().ok_or("--fifo needs a path")?);
            }
            "--dry-run" => args.dry_run = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(args)
}

/// Load the config named on the command line, else the default location,
/// falling back to compiled-in defaults.
fn load_config(explicit: Option<&PathBuf>) -> Result<Config, String> {
    if let Some(path) = explicit {
        return Config::load(path).map_err(|e| e.to_string());
    }
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            Ok(cfg)
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Ok(Config::default())
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            error!("{}", e);
            eprintln!("usage: vim-fifo [--config <path>] [--fifo <path>] [--dry-run]");
            std::process::exit(2);
        }
    };

    let config = match load_config(args.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let fifo = args.fifo.unwrap_or_else(|| config.fifo_path.clone());

    if args.dry_run {
        info!("dry run: instructions will only be logged");
        run(LogExecutor, &config, &fifo);
    } else {
        let vim = VimRemote::from_config(&config.vim);
        info!("forwarding to vim server {}", vim.servername());
        run(vim, &config, &fifo);
    }
}

fn run<E: CommandExecutor + 'static>(executor: E, config: &Config, fifo: &str) {
    // Install handlers before the pipe exists so an early signal still
    // leads to cleanup.
    let mut signals = match ShutdownSignals::install() {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut server = FifoServer::new(executor).with_backoff(config.retry_backoff());
    if let Err(e) = server.start(Some(fifo)) {
        error!("failed to start: {}", e);
        std::process::exit(1);
    }

    signals.wait();
    if let Err(e) = server.stop() {
        error!("failed to stop cleanly: {}", e);
        std::process::exit(1);
    }
}
