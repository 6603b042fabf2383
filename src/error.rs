use std::collections::TryReserveError;

use thiserror::Error;

pub use color_eyre::eyre::eyre;

#[derive(Debug, Error)]
pub enum Error {
    /// A packet or conversion buffer could not grow
    #[error("Allocation failure: {0}")]
    AllocationFailure(#[from] TryReserveError),

    /// The executor called the encoder out of order or with a value kind the column does not
    /// declare. Per-store checks only run when verification is enabled.
    #[error("Protocol contract violation: {0}")]
    ProtocolContractViolation(color_eyre::Report),

    /// The byte sink refused a packet or a flush
    #[error("Transport failure: {0}")]
    TransportFailure(#[from] std::io::Error),

    #[error("Bad config error: {0}")]
    BadConfigError(String),

    #[error("Invalid decimal literal: {0:?}")]
    InvalidDecimal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
