//! Send one command to a running **vim-fifo** listener.
//!
//! ```text
//! vim-fifo-send [--fifo <path>] [--pwd <dir>] [--mode <tag>] [--] <arg>...
//! ```
//!
//! Example:
//!     vim-fifo-send -- edit "notes with spaces.md"
//!
//! The working directory defaults to the current one.  Exits non-zero when
//! no listener is attached to the pipe.

use vim_fifo::config::{expand_path, Config, DEFAULT_FIFO_PATH};
use vim_fifo::ipc::sender::FifoSender;
use vim_fifo::message::{Context, Message, VIM_EXE_MODE};

const USAGE: &str = "usage: vim-fifo-send [--fifo <path>] [--pwd <dir>] [--mode <tag>] [--] <arg>...";

struct Args {
    fifo: Option<String>,
    pwd: Option<String>,
    mode: String,
    arguments: Vec<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        fifo: None,
        pwd: None,
        mode: VIM_EXE_MODE.into(),
        arguments: Vec::new(),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--fifo" => args.fifo = Some(it.next().ok_or("--fifo needs a path")?),
            "--pwd" => args.pwd = Some(it.next().ok_or("--pwd needs a directory")?),
            "--mode" => args.mode = it.next().ok_or("--mode needs a value")?,
            "--" => {
                args.arguments.extend(it.by_ref());
                break;
            }
            _ => args.arguments.push(arg),
        }
    }
    if args.arguments.is_empty() {
        return Err("no command given".into());
    }
    Ok(args)
}

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let fifo = args.fifo.unwrap_or_else(|| {
        let cfg_path = vim_fifo::config::config_dir().join("config.json");
        Config::load(&cfg_path)
            .map(|c| c.fifo_path)
            .unwrap_or_else(|_| DEFAULT_FIFO_PATH.into())
    });

    let pwd = match args.pwd {
        Some(p) => p,
        None => match std::env::current_dir() {
            Ok(dir) => dir.display().to_string(),
            Err(e) => {
                eprintln!("cannot determine current directory: {}", e);
                std::process::exit(1);
            }
        },
    };

    let msg = Message::new(args.mode, Context::new(pwd), args.arguments);
    if let Err(e) = FifoSender::new(expand_path(&fifo)).send(&msg) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
