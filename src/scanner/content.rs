//! Content inspection for regular files: SHA-256 digest and a best-effort
//! MIME type.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Bytes inspected when sniffing the content type.
const SNIFF_LEN: usize = 512;

/// Compute the SHA-256 hex digest of a file's content.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Detect the content type of a file.
///
/// An empty file yields an empty string. Otherwise the extension decides when
/// it is known; unknown extensions fall back to a look at the first bytes.
pub fn detect_content_type(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    if head.is_empty() {
        return Ok(String::new());
    }

    if let Some(mime) = mime_guess::from_path(path).first() {
        return Ok(mime.essence_str().to_string());
    }
    Ok(sniff(&head).to_string())
}

fn sniff(head: &[u8]) -> &'static str {
    // A multi-byte UTF-8 sequence cut at SNIFF_LEN still counts as text.
    let text = match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    let has_control = head
        .iter()
        .any(|b| matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F));
    if text && !has_control {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}
