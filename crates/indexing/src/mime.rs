//! MIME detection: extension lookup first, magic bytes as the slow fallback.

use std::path::Path;
use tokio::io::AsyncReadExt;

/// Bytes read from the start of a file when sniffing
const SNIFF_LEN: usize = 262;

struct MagicPattern {
    offset: usize,
    bytes: &'static [u8],
    mime: &'static str,
}

const fn pattern(offset: usize, bytes: &'static [u8], mime: &'static str) -> MagicPattern {
    MagicPattern { offset, bytes, mime }
}

/// Checked in order; longer, more specific signatures come first.
const MAGIC_PATTERNS: &[MagicPattern] = &[
    pattern(0, b"\x89PNG\r\n\x1a\n", "image/png"),
    pattern(0, b"\xFF\xD8\xFF", "image/jpeg"),
    pattern(0, b"GIF87a", "image/gif"),
    pattern(0, b"GIF89a", "image/gif"),
    pattern(0, b"II*\x00", "image/tiff"),
    pattern(0, b"MM\x00*", "image/tiff"),
    pattern(0, b"BM", "image/bmp"),
    pattern(8, b"WEBP", "image/webp"),
    pattern(4, b"ftypheic", "image/heic"),
    pattern(4, b"ftypqt", "video/quicktime"),
    pattern(4, b"ftypM4A", "audio/mp4"),
    pattern(4, b"ftyp", "video/mp4"),
    pattern(8, b"AVI ", "video/x-msvideo"),
    pattern(8, b"WAVE", "audio/x-wav"),
    pattern(8, b"AIFF", "audio/x-aiff"),
    pattern(0, b"\x1A\x45\xDF\xA3", "video/x-matroska"),
    pattern(0, b"ID3", "audio/mpeg"),
    pattern(0, b"fLaC", "audio/x-flac"),
    pattern(0, b"OggS", "audio/ogg"),
    pattern(0, b"%PDF", "application/pdf"),
    pattern(0, b"PK\x03\x04", "application/zip"),
    pattern(0, b"Rar!\x1A\x07", "application/x-rar-compressed"),
    pattern(0, b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
    pattern(0, b"\x1F\x8B", "application/gzip"),
    pattern(0, b"BZh", "application/x-bzip2"),
    pattern(0, b"\xFD7zXZ\x00", "application/x-xz"),
    pattern(257, b"ustar", "application/x-tar"),
    pattern(0, b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1", "application/x-ole-storage"),
    pattern(0, b"{\\rtf", "text/rtf"),
    pattern(0, b"\x7FELF", "application/x-executable"),
    pattern(0, b"MZ", "application/vnd.microsoft.portable-executable"),
    pattern(0, b"SQLite format 3\x00", "application/vnd.sqlite3"),
    pattern(0, b"wOFF", "font/woff"),
    pattern(0, b"wOF2", "font/woff2"),
];

/// Guess from the file name's extension only
pub fn from_extension(name: &str) -> Option<String> {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Match a buffer against the magic-byte table
pub fn from_magic(buf: &[u8]) -> Option<&'static str> {
    MAGIC_PATTERNS
        .iter()
        .find(|p| {
            let end = p.offset + p.bytes.len();
            buf.len() >= end && &buf[p.offset..end] == p.bytes
        })
        .map(|p| p.mime)
}

/// Open the file and sniff its first bytes. Any I/O error yields `None`.
pub async fn sniff(path: &Path) -> Option<String> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("Unable to sniff {}: {}", path.display(), e);
            return None;
        }
    };

    let mut buf = Vec::with_capacity(SNIFF_LEN);
    if let Err(e) = file.take(SNIFF_LEN as u64).read_to_end(&mut buf).await {
        tracing::debug!("Unable to read {} for sniffing: {}", path.display(), e);
        return None;
    }

    from_magic(&buf).map(str::to_string)
}

/// Extension lookup, then content sniffing on a miss when `sniff_content` is set
pub async fn detect(name: &str, path: &Path, sniff_content: bool) -> Option<String> {
    match from_extension(name) {
        Some(mime) => Some(mime),
        None if sniff_content => sniff(path).await,
        None => None,
    }
}
