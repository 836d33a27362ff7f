use clap::Parser;

/// Command-line surface: `kplex [-b] [-l <facility>] [-q <size>] [-f <file>]
/// [<interface specifier> ...]`, unchanged from the original `getopt`
/// string `"bl:q:f:"`.
#[derive(Parser, Debug)]
#[command(name = "kplex", about = "An any-to-any NMEA-0183 multiplexer")]
pub struct Cli {
    /// Daemonize: fork into the background and log to syslog instead of stderr.
    #[arg(short = 'b')]
    pub background: bool,

    /// Syslog facility to log under once daemonized.
    #[arg(short = 'l', value_name = "FACILITY")]
    pub logto: Option<String>,

    /// Central queue capacity (minimum 2).
    #[arg(short = 'q', value_name = "SIZE")]
    pub qsize: Option<usize>,

    /// Config file path, or "-" to skip config file lookup entirely.
    #[arg(short = 'f', value_name = "FILE")]
    pub config_file: Option<String>,

    /// Interface specifiers: `type:key=value,key=value,...`.
    pub specs: Vec<String>,
}
