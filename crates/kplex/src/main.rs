//! kplex: an any-to-any NMEA-0183 multiplexer. Parses the command line and
//! config file, builds the configured interfaces, then runs the fan-out
//! engine until every interface has been reaped — the same overall shape as
//! the original `main`, split across `kplex-config`, `kplex-transport`,
//! `kplex-topology` and `kplex-engine` instead of one function.

mod assemble;
mod daemonize;
mod logging;

use std::process::ExitCode;

use clap::Parser;

use kplex_config::Cli;
use kplex_engine::{install_shutdown_handler, run_reaper, spawn_engine, spawn_input, spawn_output};
use kplex_topology::Direction;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("kplex: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let resolved = kplex_config::load(&cli)?;

    if resolved.background {
        daemonize::daemonize()?;
    }
    logging::init(resolved.background, resolved.logto);

    let built = assemble::build(&resolved)?;
    install_shutdown_handler(built.topology.clone())?;

    let engine_handle = spawn_engine(built.topology.clone(), built.central.clone());
    let worker_handles: Vec<_> = built
        .interfaces
        .iter()
        .map(|iface| match iface.direction {
            Direction::In => spawn_input(built.topology.clone(), iface.clone(), built.central.clone()),
            Direction::Out => spawn_output(built.topology.clone(), iface.clone()),
        })
        .collect();

    run_reaper(&built.topology);

    engine_handle.join().expect("engine thread panicked");
    for handle in worker_handles {
        handle.join().expect("worker thread panicked");
    }

    Ok(())
}
