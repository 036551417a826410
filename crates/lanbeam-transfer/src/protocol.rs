/// Wire format for a single-file transfer.
///
/// ```text
/// [header]   filename + '\n'   UTF-8, no path separators, bounded length
/// [payload]  raw file bytes    unframed; EOF (sender close) ends the transfer
/// ```
///
/// There is no length prefix and no checksum. Chunking is an I/O detail and
/// not part of the wire contract; any chunking that preserves byte order and
/// content exactly is legal.

use crate::TransferError;

/// Buffer size for file and socket I/O.
pub const CHUNK_SIZE: usize = 1024;

/// Maximum header bytes read before the transfer is rejected. A peer that
/// never sends the newline terminator must not be able to make us read
/// unbounded data.
pub const MAX_HEADER_LEN: usize = 1024;

/// Validate a received filename before it touches the filesystem.
///
/// Trims surrounding whitespace, then rejects anything that could escape the
/// destination directory: empty names, path separators, `..`, and control
/// bytes. Returns the trimmed name on success.
pub fn sanitize_filename(raw: &str) -> Result<&str, TransferError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(TransferError::Protocol("empty filename in header".into()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(TransferError::Protocol(format!(
            "filename contains a path separator: {name:?}"
        )));
    }
    if name == "." || name == ".." {
        return Err(TransferError::Protocol(format!(
            "filename is a directory reference: {name:?}"
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(TransferError::Protocol(
            "filename contains control characters".into(),
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert_eq!(sanitize_filename("a.txt").unwrap(), "a.txt");
        assert_eq!(sanitize_filename("photo (1).jpg").unwrap(), "photo (1).jpg");
        // The receiver trims the trailing newline/whitespace, as the header
        // terminator is not part of the name.
        assert_eq!(sanitize_filename("a.txt\r").unwrap(), "a.txt");
    }

    #[test]
    fn rejects_traversal() {
        assert!(sanitize_filename("../../evil").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("dir/inner.txt").is_err());
        assert!(sanitize_filename("dir\\inner.txt").is_err());
        assert!(sanitize_filename("/etc/passwd").is_err());
    }

    #[test]
    fn rejects_empty_and_control() {
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("   ").is_err());
        assert!(sanitize_filename("a\0b").is_err());
        assert!(sanitize_filename("a\x1bb").is_err());
    }
}
