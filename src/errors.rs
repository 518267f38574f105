//! Error types for the mailer.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide error.
#[derive(Error, Debug)]
pub enum MailerError {
    #[error(transparent)]
    FileNotFound(#[from] FileNotFoundError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MailerError {
    pub fn code(&self) -> &'static str {
        match self {
            MailerError::FileNotFound(_) => FileNotFoundError::CODE,
            MailerError::Fetch(_) => FetchError::CODE,
            MailerError::Config(_) => ConfigError::CODE,
            MailerError::Io(_) => "IO",
        }
    }
}

/// A file named by an attachment or body source does not exist.
#[derive(Error, Debug)]
#[error("could not open file {}", path.display())]
pub struct FileNotFoundError {
    pub path: PathBuf,
}

impl FileNotFoundError {
    pub const CODE: &'static str = "FILE_NOT_FOUND";
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Fetching a URL body failed.
#[derive(Error, Debug)]
#[error("failed to fetch {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub const CODE: &'static str = "FETCH_FAILED";
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// The mail transport rejected or failed to deliver a message.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub const CODE: &'static str = "TRANSPORT_FAILED";
}

/// Configuration could not be loaded.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    pub const CODE: &'static str = "INVALID_CONFIG";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let e: MailerError = FileNotFoundError::new("/nope/a.txt").into();
        assert_eq!(e.code(), "FILE_NOT_FOUND");
        assert_eq!(e.to_string(), "could not open file /nope/a.txt");

        let e: MailerError = ConfigError("bad".into()).into();
        assert_eq!(e.code(), "INVALID_CONFIG");
    }
}
