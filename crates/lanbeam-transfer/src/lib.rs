/// Single-file transfer over an ordered byte stream.
///
/// The wire format is a newline-terminated filename header followed by the
/// raw file bytes; the sender closing its write side marks end-of-transfer.
/// One connection carries exactly one header and one payload and is never
/// reused.

use std::path::PathBuf;

pub mod protocol;
pub mod receive;
pub mod send;

pub use protocol::{sanitize_filename, CHUNK_SIZE, MAX_HEADER_LEN};
pub use receive::receive_file;
pub use send::send_file;

/// Errors raised by either side of a transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Malformed or hostile header on the receiving side.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Mid-stream I/O failure on either side.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] std::io::Error),
}
