use std::path::Path;

use kplex_core::{KplexError, Result};

use crate::cli::Cli;
use crate::discovery::discover_config_path;
use crate::facility::Facility;
use crate::file::parse_file;
use crate::ifspec::{parse_arg, InterfaceSpec};

/// The fully-resolved configuration: command line, config file and
/// defaults merged in the original's order of preference (CLI, then
/// `[global]`, then built-in default) for `qsize`/`background`/`logto`,
/// and config-file interfaces followed by command-line interface
/// specifiers for the interface list.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub qsize: usize,
    pub background: bool,
    pub logto: Facility,
    pub interfaces: Vec<InterfaceSpec>,
}

/// Builds a [`ResolvedConfig`] from parsed CLI args, reading and merging a
/// config file per `-f`/discovery rules along the way.
pub fn load(cli: &Cli) -> Result<ResolvedConfig> {
    let file_config = match cli.config_file.as_deref() {
        Some("-") => None,
        Some(path) => Some(parse_file(Path::new(path))?),
        None => match discover_config_path() {
            Some(path) => Some(parse_file(&path)?),
            None => None,
        },
    };

    let global = file_config.as_ref().map(|f| f.global.clone()).unwrap_or_default();

    let qsize = cli.qsize.or(global.qsize).unwrap_or(kplex_core::DEFQUEUESZ);
    if qsize < kplex_core::MIN_QUEUE_SIZE {
        return Err(KplexError::InvalidQueueCapacity(qsize));
    }

    let background = cli.background || global.background;

    let logto = match &cli.logto {
        Some(name) => Facility::parse(name)?,
        None => global.logto.unwrap_or(Facility::Daemon),
    };

    let mut interfaces = file_config.map(|f| f.interfaces).unwrap_or_default();
    for spec in &cli.specs {
        interfaces.push(parse_arg(spec)?);
    }

    Ok(ResolvedConfig {
        qsize,
        background,
        logto,
        interfaces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli_from(args: &[&str]) -> Cli {
        let mut full = vec!["kplex"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn cli_flag_beats_config_file_default() {
        // No config file present ("-f -"), qsize from CLI only.
        let cli = cli_from(&["-f", "-", "-q", "16", "file:filename=/tmp/x,direction=out"]);
        let resolved = load(&cli).unwrap();
        assert_eq!(resolved.qsize, 16);
        assert_eq!(resolved.interfaces.len(), 1);
    }

    #[test]
    fn defaults_apply_with_no_config_and_no_overrides() {
        let cli = cli_from(&["-f", "-"]);
        let resolved = load(&cli).unwrap();
        assert_eq!(resolved.qsize, kplex_core::DEFQUEUESZ);
        assert!(!resolved.background);
        assert_eq!(resolved.logto, Facility::Daemon);
        assert!(resolved.interfaces.is_empty());
    }

    #[test]
    fn rejects_qsize_below_minimum() {
        let cli = cli_from(&["-f", "-", "-q", "1"]);
        assert!(matches!(load(&cli), Err(KplexError::InvalidQueueCapacity(1))));
    }
}
