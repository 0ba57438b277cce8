//! dls-core binary.
//!
//! Scans the process table once and prints the deleted-library metrics.
//! On a fatal error nothing is written to stdout and the exit code is
//! non-zero.

use clap::Parser;
use dls_common::Result;
use dls_core::cli::Cli;
use dls_core::collect::ProcFs;
use dls_core::exit_codes::ExitCode;
use dls_core::{derive_library_process_counts, logging, metrics, scan_all_processes};
use std::io::Write;
use tracing::debug;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_settings()) {
        eprintln!("dls-core: {e}");
        std::process::exit(ExitCode::for_error(&e).as_i32());
    }

    let code = match run(&cli) {
        Ok(()) => ExitCode::Clean,
        Err(e) => {
            eprintln!("dls-core: {e}");
            ExitCode::for_error(&e)
        }
    };
    std::process::exit(code.as_i32());
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.scan_config();
    config.validate()?;
    debug!(
        proc_root = %config.proc_root.display(),
        format = %cli.format,
        "starting scan"
    );

    let source = ProcFs::new(&config.proc_root);
    let outcome = scan_all_processes(&source, &config)?;
    let libraries = derive_library_process_counts(&outcome.per_process);
    let document = metrics::render(cli.format, &libraries, &outcome.report)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(document.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
