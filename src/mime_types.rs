//! File extension to content type lookup, with magic-byte sniffing as fallback.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Fallback type when neither the extension nor the content is recognised.
pub const OCTET_STREAM: &str = "application/octet-stream";

const SNIFF_LEN: usize = 512;

/// Content type for a file extension (case-insensitive, without the dot).
pub fn from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        // text and web
        "txt" => "text/plain",
        "htm" | "html" => "text/html",
        "csv" => "text/csv",
        "php" => "application/x-httpd-php",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "swf" => "application/x-shockwave-flash",
        "flv" => "video/x-flv",

        // images
        "png" => "image/png",
        "jpe" | "jpeg" | "jpg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "ico" => "image/vnd.microsoft.icon",
        "tiff" | "tif" => "image/tiff",
        "svg" | "svgz" => "image/svg+xml",

        // archives
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "exe" | "msi" => "application/x-msdownload",
        "cab" => "application/vnd.ms-cab-compressed",

        // audio / video
        "mp3" => "audio/mpeg",
        "qt" | "mov" => "video/quicktime",

        // adobe
        "pdf" => "application/pdf",
        "psd" => "image/vnd.adobe.photoshop",
        "ai" | "eps" | "ps" => "application/postscript",

        // ms office
        "doc" => "application/msword",
        "rtf" => "application/rtf",
        "xls" | "xlsx" => "application/vnd.ms-excel",
        "ppt" => "application/vnd.ms-powerpoint",

        // open office
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",

        _ => return None,
    };
    Some(mime)
}

/// Guess a content type from the leading bytes of a file.
pub fn sniff(head: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b", "application/gzip"),
        (b"II*\x00", "image/tiff"),
        (b"MM\x00*", "image/tiff"),
        (b"<?xml", "application/xml"),
    ];

    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| head.starts_with(magic)) {
        return Some(*mime);
    }
    if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    // BMP file header: 4 reserved zero bytes after the file size
    if head.len() >= 14 && head.starts_with(b"BM") && head[6..10] == [0u8; 4] {
        return Some("image/bmp");
    }
    // ID3v2 tag: major version 2 to 4
    if head.len() >= 10 && head.starts_with(b"ID3") && (2..=4).contains(&head[3]) {
        return Some("audio/mpeg");
    }
    if head.is_empty() || head.contains(&0) {
        return None;
    }
    // a multi-byte char may be cut at the sniff window edge
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or(""),
        Err(_) => return None,
    };
    let lower = text.trim_start().to_ascii_lowercase();
    if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        Some("text/html")
    } else {
        Some("text/plain")
    }
}

/// Resolve the content type of an existing file: extension table first,
/// then content sniffing, then [`OCTET_STREAM`].
pub fn resolve(path: &Path) -> std::io::Result<String> {
    if let Some(mime) = path.extension().and_then(|e| e.to_str()).and_then(from_extension) {
        return Ok(mime.to_string());
    }

    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    Ok(sniff(&head).unwrap_or(OCTET_STREAM).to_string())
}
