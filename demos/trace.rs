//! Prints the decoded spectrometer traffic of a capture.
//!
//! ```text
//! cargo run --example trace -- packets.json [offset] [count]
//! ```

use std::process::ExitCode;

use log::error;
use sharktooth::{Session, TraceOptions};

fn main() -> ExitCode {
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .unwrap();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        error!("Usage: trace <capture.json> [offset] [count]");
        return ExitCode::FAILURE;
    };
    let offset = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(0);
    let count = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(0);

    let mut session = match Session::load(&path) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = session.select_device() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    match session.format_trace(&TraceOptions::page(offset, count)) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
