//! Encoding helpers, word wrapping and boundary generation.

use base64::{engine::general_purpose::STANDARD as B64, Engine};

/// Line terminator used throughout the wire format.
pub const CRLF: &str = "\r\n";

/// Maximum encoded line length for base64 bodies (RFC 2045).
pub const BASE64_LINE_LENGTH: usize = 76;

/// Base64-encode `data`, splitting the output into 76-character lines that
/// each end with CRLF.
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = B64.encode(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH * 2 + 2);
    // base64 output is ASCII, so byte chunks are valid str slices
    for chunk in encoded.as_bytes().chunks(BASE64_LINE_LENGTH) {
        result.push_str(std::str::from_utf8(chunk).unwrap_or(""));
        result.push_str(CRLF);
    }
    result
}

/// Wraps `text` at `width` columns by breaking at spaces. Existing newlines
/// are kept and words longer than `width` are never cut. `width == 0` leaves
/// the text untouched.
pub fn word_wrap(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }
    text.split('\n')
        .map(|line| wrap_line(line, width))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_line(line: &str, width: usize) -> String {
    let mut result = String::with_capacity(line.len());
    let mut current = 0;
    for (i, word) in line.split(' ').enumerate() {
        let len = word.chars().count();
        if i == 0 {
            current = len;
        } else if current + 1 + len > width {
            result.push('\n');
            current = len;
        } else {
            result.push(' ');
            current += 1 + len;
        }
        result.push_str(word);
    }
    result
}

/// Random MIME boundary: `prefix` followed by 32 hex characters.
pub fn generate_safe_boundary(prefix: &str) -> String {
    let mut bytes = [0u8; 16];
    if getrandom::getrandom(&mut bytes).is_err() {
        // no entropy source; the clock still varies between builders
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        bytes = nanos.to_le_bytes();
    }
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", prefix, hex)
}

/// `"Name <address>"` when a display name is given, the bare address otherwise.
pub fn format_address(address: &str, name: &str) -> String {
    if name.is_empty() {
        address.to_string()
    } else {
        format!("{} <{}>", name, address)
    }
}

/// Quoted-printable encoding (RFC 2045).
pub fn encode_quoted_printable(text: &str, line_length: usize) -> String {
    let bytes = text.as_bytes();
    let mut result = String::new();
    let mut current_line_length = 0;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        let encoded: String = if byte == 0x0a {
            result.push_str(CRLF);
            current_line_length = 0;
            i += 1;
            continue;
        } else if byte == 0x0d {
            if i + 1 < bytes.len() && bytes[i + 1] == 0x0a {
                result.push_str(CRLF);
                current_line_length = 0;
                i += 2;
                continue;
            } else {
                "=0D".to_string()
            }
        } else {
            let is_whitespace = byte == 0x20 || byte == 0x09;
            let next_is_line_break = i + 1 >= bytes.len() || bytes[i + 1] == 0x0a || bytes[i + 1] == 0x0d;
            let needs_encoding =
                (byte < 32 && !is_whitespace) || byte > 126 || byte == b'=' || (is_whitespace && next_is_line_break);

            if needs_encoding {
                format!("={:02X}", byte)
            } else {
                char::from(byte).to_string()
            }
        };

        if current_line_length + encoded.len() > line_length.saturating_sub(3) {
            result.push_str("=\r\n");
            current_line_length = 0;
        }
        result.push_str(&encoded);
        current_line_length += encoded.len();
        i += 1;
    }

    result
}

/// RFC 2047 header encoding (UTF-8 Q). ASCII input is returned unchanged.
pub fn encode_header(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let mut encoded = String::new();
    for byte in text.bytes() {
        if (33..=126).contains(&byte) && byte != b'?' && byte != b'=' && byte != b'_' {
            encoded.push(char::from(byte));
        } else if byte == b' ' {
            encoded.push('_');
        } else {
            encoded.push_str(&format!("={:02X}", byte));
        }
    }
    format!("=?UTF-8?Q?{}?=", encoded)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Read, Write};
    use std::path::{Path, PathBuf};

    /// Scratch directory under the system temp dir, removed on drop.
    pub struct ScratchDir(PathBuf);

    impl ScratchDir {
        pub fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("fluent-mailer-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        pub fn path(&self) -> &Path {
            &self.0
        }

        pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
            let path = self.0.join(name);
            std::fs::write(&path, contents).unwrap();
            path
        }
    }

    /// Serves one canned HTTP response and returns the raw request it received.
    pub fn serve_once(status: &'static str, body: &'static str) -> (String, std::thread::JoinHandle<String>) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/body.html", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap();
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (url, handle)
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
}
