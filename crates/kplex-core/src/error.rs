use std::result;

/// The full error taxonomy for kplex, spanning configuration, resource and
/// runtime failures (see §7 of the design: config-syntax, config-semantic,
/// resource, transport-fatal, shutdown-request — transport-transient and
/// protocol errors are deliberately absent here, they never propagate as
/// `Result`s).
#[derive(Debug, thiserror::Error)]
pub enum KplexError {
    #[error("invalid queue capacity {0}: minimum is {min}", min = crate::MIN_QUEUE_SIZE)]
    InvalidQueueCapacity(usize),

    #[error("{msg}")]
    Config { line: Option<u32>, msg: String },

    #[error("duplicate [global] section at line {line}")]
    DuplicateGlobalSection { line: u32 },

    #[error("unrecognised interface type '{0}'")]
    UnknownInterfaceType(String),

    #[error("unknown log facility '{0}'")]
    UnknownFacility(String),

    #[error("interface direction (in/out/both) not specified")]
    MissingDirection,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = result::Result<T, KplexError>;
