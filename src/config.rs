//! Builder defaults, loadable from JSON.

use crate::errors::{ConfigError, MailerError};
use crate::logger::LogLevel;
use std::fmt;
use std::path::Path;

/// Sender used when neither `default_from` nor `server_name` is configured.
pub const FALLBACK_FROM: &str = "root@localhost.localdomain";

/// Content-Transfer-Encoding of the main body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum TransferEncoding {
    #[serde(rename = "7bit")]
    SevenBit,
    #[default]
    #[serde(rename = "8bit")]
    EightBit,
    #[serde(rename = "base64")]
    Base64,
    #[serde(rename = "quoted-printable")]
    QuotedPrintable,
    #[serde(rename = "binary")]
    Binary,
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Options for creating a `MessageBuilder`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MailerConfig {
    pub server_name: Option<String>,
    pub default_from: Option<String>,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default)]
    pub transfer_encoding: TransferEncoding,
    #[serde(default)]
    pub word_wrap: usize,
    #[serde(default = "default_x_mailer")]
    pub x_mailer: Option<String>,
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_charset() -> String {
    "iso-8859-1".to_string()
}
fn default_x_mailer() -> Option<String> {
    Some(format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            server_name: None,
            default_from: None,
            charset: default_charset(),
            transfer_encoding: TransferEncoding::default(),
            word_wrap: 0,
            x_mailer: default_x_mailer(),
            log_level: LogLevel::default(),
        }
    }
}

impl MailerConfig {
    pub fn from_json(json: &str) -> Result<Self, MailerError> {
        serde_json::from_str(json).map_err(|e| ConfigError(format!("invalid mailer config: {}", e)).into())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MailerError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Sender address for new messages.
    pub fn sender(&self) -> String {
        if let Some(ref from) = self.default_from {
            if !from.is_empty() {
                return from.clone();
            }
        }
        match self.server_name.as_deref() {
            Some(server) if !server.is_empty() => format!("no-reply@{}", server),
            _ => FALLBACK_FROM.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_support::ScratchDir;

    #[test]
    fn test_defaults() {
        let config = MailerConfig::default();
        assert_eq!(config.charset, "iso-8859-1");
        assert_eq!(config.transfer_encoding.to_string(), "8bit");
        assert_eq!(config.x_mailer.as_deref(), Some("fluent-mailer/0.1.0"));
        assert_eq!(config.sender(), "root@localhost.localdomain");
    }

    #[test]
    fn test_sender_resolution() {
        let config = MailerConfig {
            server_name: Some("example.org".into()),
            ..MailerConfig::default()
        };
        assert_eq!(config.sender(), "no-reply@example.org");

        let config = MailerConfig {
            default_from: Some("ops@example.org".into()),
            ..config
        };
        assert_eq!(config.sender(), "ops@example.org");
    }

    #[test]
    fn test_from_json() {
        let config = MailerConfig::from_json(
            r#"{"server_name": "mail.test", "charset": "utf-8", "transfer_encoding": "quoted-printable", "word_wrap": 72, "x_mailer": null, "log_level": "debug"}"#,
        )
        .unwrap();
        assert_eq!(config.charset, "utf-8");
        assert_eq!(config.transfer_encoding, TransferEncoding::QuotedPrintable);
        assert_eq!(config.word_wrap, 72);
        assert_eq!(config.x_mailer, None);
        assert_eq!(config.log_level, LogLevel::Debug);

        let empty = MailerConfig::from_json("{}").unwrap();
        assert_eq!(empty, MailerConfig::default());

        let err = MailerConfig::from_json("{\"word_wrap\": \"wide\"}").unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_from_file() {
        let dir = ScratchDir::new();
        let path = dir.write("mailer.json", r#"{"default_from": "a@b.co"}"#);
        assert_eq!(MailerConfig::from_file(&path).unwrap().sender(), "a@b.co");
        assert!(MailerConfig::from_file(dir.path().join("missing.json")).is_err());
    }
}
