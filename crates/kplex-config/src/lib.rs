//! Configuration surface for kplex: CLI argument parsing, the config-file
//! grammar, interface specifier parsing, log facility names, and config
//! file discovery — everything `options.c` and the command-line half of
//! `kplex.c`'s `main` handle in the original.

mod cli;
mod config;
mod discovery;
mod facility;
mod file;
mod ifspec;

pub use cli::Cli;
pub use config::{load, ResolvedConfig};
pub use discovery::discover_config_path;
pub use facility::Facility;
pub use file::{parse_file, parse_str, FileConfig, GlobalOptions};
pub use ifspec::{parse_arg, Direction, InterfaceSpec, InterfaceType};
