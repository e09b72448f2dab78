//! Error type shared by the entropy and generation modules.
//!
//! Every variant renders as a single `<context>: <system error>` line, which is
//! exactly what the CLI prints on standard error before exiting.

use std::io;

/// Exit status when the entropy source cannot be opened.
pub const EXIT_SOURCE_UNAVAILABLE: u8 = 16;
/// Exit status when the entropy source fails or runs dry mid-run.
pub const EXIT_SOURCE_READ: u8 = 17;
/// Exit status when standard output cannot be written.
pub const EXIT_OUTPUT: u8 = 18;

#[derive(Debug, thiserror::Error)]
pub enum MkuuidError {
    /// The random device could not be opened at all.
    #[error("open(\"{path}\") failed: {source}")]
    SourceUnavailable { path: String, source: io::Error },

    /// A read from an already open source returned an I/O error.
    #[error("read from {origin} failed after {filled} of 16 bytes: {source}")]
    SourceRead {
        origin: String,
        filled: usize,
        source: io::Error,
    },

    /// The source signalled end-of-stream before a full block was collected.
    #[error("read from {origin} failed: end of stream after {filled} of 16 bytes")]
    SourceExhausted { origin: String, filled: usize },

    #[error("write to standard output failed: {0}")]
    Output(#[source] io::Error),
}

impl MkuuidError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            MkuuidError::SourceUnavailable { .. } => EXIT_SOURCE_UNAVAILABLE,
            MkuuidError::SourceRead { .. } | MkuuidError::SourceExhausted { .. } => {
                EXIT_SOURCE_READ
            }
            MkuuidError::Output(_) => EXIT_OUTPUT,
        }
    }
}

pub type Result<T> = std::result::Result<T, MkuuidError>;
