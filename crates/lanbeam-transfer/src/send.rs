/// Producer side: stream a file from disk to a connected peer.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::protocol::CHUNK_SIZE;
use crate::TransferError;

/// Write the header line and the full file content to `stream`, then shut
/// down the write half to signal end-of-transfer. Returns the number of
/// payload bytes sent.
pub async fn send_file<S>(stream: &mut S, path: &Path) -> Result<u64, TransferError>
where
    S: AsyncWrite + Unpin,
{
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            TransferError::Protocol(format!("source path has no usable filename: {}", path.display()))
        })?;

    let mut file = File::open(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => TransferError::FileNotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => TransferError::PermissionDenied(path.to_path_buf()),
        _ => TransferError::TransferFailed(e),
    })?;

    // Header is fully written before any payload byte.
    stream.write_all(filename.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    debug!(filename, "header sent");

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        stream.write_all(&buf[..n]).await?;
        sent += n as u64;
    }

    stream.flush().await?;
    stream.shutdown().await?;
    info!(filename, bytes = sent, "file sent");
    Ok(sent)
}
