//! A file to embed in a multipart message.

use crate::errors::{FileNotFoundError, MailerError};
use crate::mime_types;
use crate::utils::encode_base64_lines;
use std::fmt;
use std::path::{Path, PathBuf};

/// How the receiving client should present an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    #[default]
    Attachment,
    Inline,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Attachment => f.write_str("attachment"),
            Disposition::Inline => f.write_str("inline"),
        }
    }
}

/// File attachment. The file is only read when the message body is built.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Attachment {
    path: Option<PathBuf>,
    name: Option<String>,
    mime: Option<String>,
    #[serde(default)]
    mode: Disposition,
}

impl Attachment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with(
        path: impl Into<PathBuf>,
        name: Option<String>,
        mime: Option<String>,
        mode: Disposition,
    ) -> Self {
        Self {
            path: Some(path.into()),
            name,
            mime,
            mode,
        }
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.path = Some(path.into());
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides content type resolution for this attachment.
    pub fn set_mime(&mut self, mime: impl Into<String>) -> &mut Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn set_mode(&mut self, mode: Disposition) -> &mut Self {
        self.mode = mode;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Display name; defaults to the file name of the path.
    pub fn name(&self) -> String {
        match (&self.name, &self.path) {
            (Some(name), _) => name.clone(),
            (None, Some(path)) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            (None, None) => String::new(),
        }
    }

    pub fn mode(&self) -> Disposition {
        self.mode
    }

    /// Content type of the attachment.
    ///
    /// Returns `Ok(None)` when no path is set. A path that does not exist is
    /// an error even when a content type was set explicitly.
    pub fn mime(&self) -> Result<Option<String>, MailerError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };
        let path = existing(path)?;
        match &self.mime {
            Some(mime) => Ok(Some(mime.clone())),
            None => Ok(Some(mime_types::resolve(path)?)),
        }
    }

    /// File content, base64-encoded in CRLF-terminated 76-character lines.
    pub fn data(&self) -> Result<String, MailerError> {
        let path = self.path.as_deref().unwrap_or_else(|| Path::new(""));
        let bytes = std::fs::read(existing(path)?)?;
        Ok(encode_base64_lines(&bytes))
    }
}

fn existing(path: &Path) -> Result<&Path, FileNotFoundError> {
    if path.as_os_str().is_empty() || !path.is_file() {
        return Err(FileNotFoundError::new(path));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_support::ScratchDir;
    use base64::{engine::general_purpose::STANDARD as B64, Engine};

    #[test]
    fn test_data_roundtrip() {
        let dir = ScratchDir::new();
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let path = dir.write("data.bin", &bytes);

        let encoded = Attachment::new(&path).data().unwrap();
        assert!(encoded.split("\r\n").all(|line| line.len() <= 76));
        assert!(encoded.ends_with("\r\n"));

        let joined: String = encoded.split("\r\n").collect();
        assert_eq!(B64.decode(joined).unwrap(), bytes);
    }

    #[test]
    fn test_missing_file() {
        let attachment = Attachment::new("/definitely/not/here.pdf");
        let err = attachment.data().unwrap_err();
        assert_eq!(err.code(), "FILE_NOT_FOUND");
        assert!(matches!(attachment.mime(), Err(MailerError::FileNotFound(_))));

        assert!(matches!(Attachment::default().data(), Err(MailerError::FileNotFound(_))));
    }

    #[test]
    fn test_mime() {
        let dir = ScratchDir::new();
        let png = dir.write("chart.png", b"\x89PNG\r\n\x1a\n");
        assert_eq!(Attachment::new(&png).mime().unwrap().as_deref(), Some("image/png"));

        let blob = dir.write("blob.qqq", [0u8, 1, 2, 3]);
        assert_eq!(
            Attachment::new(&blob).mime().unwrap().as_deref(),
            Some("application/octet-stream")
        );

        let mut explicit = Attachment::new(&blob);
        explicit.set_mime("application/x-custom");
        assert_eq!(explicit.mime().unwrap().as_deref(), Some("application/x-custom"));

        assert_eq!(Attachment::default().mime().unwrap(), None);
    }

    #[test]
    fn test_name_and_mode() {
        let mut attachment = Attachment::new("/tmp/reports/q3.pdf");
        assert_eq!(attachment.name(), "q3.pdf");
        assert_eq!(attachment.mode(), Disposition::Attachment);

        attachment.set_name("Quarterly.pdf").set_mode(Disposition::Inline);
        assert_eq!(attachment.name(), "Quarterly.pdf");
        assert_eq!(attachment.mode().to_string(), "inline");
    }
}
