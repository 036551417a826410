/// Consumer side: read the header, then stream the payload to disk.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::protocol::{sanitize_filename, CHUNK_SIZE, MAX_HEADER_LEN};
use crate::TransferError;

/// Read one transfer from `stream` into `dest_dir` and return the saved path.
///
/// The destination file is created only after the header passes sanitization,
/// and is removed again if anything fails mid-stream, so a failed transfer
/// leaves no partial file behind.
pub async fn receive_file<S>(stream: &mut S, dest_dir: &Path) -> Result<PathBuf, TransferError>
where
    S: AsyncRead + Unpin,
{
    let header = read_header(stream).await?;
    let filename = sanitize_filename(&header)?;
    let dest = dest_dir.join(filename);
    debug!(filename, dest = %dest.display(), "header accepted");

    let mut file = File::create(&dest).await?;
    match copy_payload(stream, &mut file).await {
        Ok(bytes) => {
            info!(filename, bytes, saved = %dest.display(), "file received");
            Ok(dest)
        }
        Err(e) => {
            drop(file);
            remove_partial(&dest).await;
            Err(e)
        }
    }
}

/// Read bytes up to and including the first `'\n'`. The read is one byte at
/// a time on purpose: the header has no length prefix and we must not
/// consume any payload bytes past the terminator.
async fn read_header<S>(stream: &mut S) -> Result<String, TransferError>
where
    S: AsyncRead + Unpin,
{
    let mut line = Vec::with_capacity(64);
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            return Err(TransferError::Protocol(
                "connection closed before header terminator".into(),
            ));
        }
        if byte[0] == b'\n' {
            break;
        }
        line.push(byte[0]);
        if line.len() >= MAX_HEADER_LEN {
            return Err(TransferError::Protocol(format!(
                "header exceeds {MAX_HEADER_LEN} bytes without a terminator"
            )));
        }
    }
    String::from_utf8(line)
        .map_err(|_| TransferError::Protocol("header is not valid UTF-8".into()))
}

async fn copy_payload<S>(stream: &mut S, file: &mut File) -> Result<u64, TransferError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).await?;
        written += n as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

async fn remove_partial(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => warn!(dest = %dest.display(), "removed partial file after failed transfer"),
        Err(e) => warn!(dest = %dest.display(), error = %e, "could not remove partial file"),
    }
}
