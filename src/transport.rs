//! Hand-off of finished messages to a mail delivery facility.
//!
//! The builder never speaks SMTP itself. A [`Transport`] receives the flattened
//! message and reports success or failure:
//!
//! - [`SendmailTransport`] pipes it into the local `sendmail` binary,
//! - [`FileTransport`] writes it to a directory as `<uuid>.eml`,
//! - [`StubTransport`] records it in memory, for tests.

use crate::errors::TransportError;
use crate::utils::{encode_header, CRLF};
use std::cell::RefCell;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use uuid::Uuid;

const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Comma-separated `To` recipients.
    pub to: String,
    pub subject: String,
    /// CRLF-joined header block, without a trailing blank line.
    pub headers: String,
    pub body: String,
}

impl OutgoingMessage {
    /// Full RFC 2822 text: `To` and `Subject` lines, the header block, a blank
    /// line and the body.
    pub fn formatted(&self) -> String {
        let mut lines = vec![
            format!("To: {}", self.to),
            format!("Subject: {}", encode_header(&self.subject)),
        ];
        if !self.headers.is_empty() {
            lines.push(self.headers.clone());
        }
        format!("{}{}{}{}", lines.join(CRLF), CRLF, CRLF, self.body)
    }
}

/// Delivery facility for built messages.
pub trait Transport {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        (**self).send(message)
    }
}

/// Sends messages with the local `sendmail` command (`sendmail -t -i` by default).
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    command: OsString,
    args: Vec<OsString>,
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SendmailTransport {
    pub fn new() -> Self {
        Self::new_with_command(DEFAULT_SENDMAIL)
    }

    pub fn new_with_command(command: impl Into<OsString>) -> Self {
        Self {
            command: command.into(),
            args: vec!["-t".into(), "-i".into()],
        }
    }

    /// Replaces the arguments passed to the command.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self) -> Command {
        let mut c = Command::new(&self.command);
        c.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        c
    }
}

impl Transport for SendmailTransport {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let mut process = self.command().spawn().map_err(|e| {
            TransportError(format!("could not spawn {}: {}", self.command.to_string_lossy(), e))
        })?;
        tracing::debug!(command = %self.command.to_string_lossy(), "piping message to sendmail");

        let written = match process.stdin.take() {
            Some(mut stdin) => stdin.write_all(message.formatted().as_bytes()),
            None => Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin unavailable")),
        };
        let output = process
            .wait_with_output()
            .map_err(|e| TransportError(format!("sendmail did not finish: {}", e)))?;

        if !output.status.success() {
            return Err(TransportError(format!(
                "sendmail exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        written.map_err(|e| TransportError(format!("couldn't write to sendmail stdin: {}", e)))
    }
}

/// Writes each message to `<dir>/<uuid>.eml`.
#[derive(Debug, Clone)]
pub struct FileTransport {
    path: PathBuf,
}

impl FileTransport {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Writes the message and returns the path of the created file.
    pub fn write(&self, message: &OutgoingMessage) -> Result<PathBuf, TransportError> {
        let file = self.path.join(format!("{}.eml", Uuid::new_v4()));
        std::fs::write(&file, message.formatted())
            .map_err(|e| TransportError(format!("could not write {}: {}", file.display(), e)))?;
        tracing::debug!(path = %file.display(), "message written");
        Ok(file)
    }
}

impl Transport for FileTransport {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.write(message).map(|_| ())
    }
}

/// Keeps every message it receives and answers with a fixed outcome.
#[derive(Debug, Default)]
pub struct StubTransport {
    failure: Option<String>,
    sent: RefCell<Vec<OutgoingMessage>>,
}

impl StubTransport {
    /// A transport that accepts every message.
    pub fn new_positive() -> Self {
        Self::default()
    }

    /// A transport that rejects every message with `reason`.
    pub fn new_negative(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            sent: RefCell::default(),
        }
    }

    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.sent.borrow().clone()
    }
}

impl Transport for StubTransport {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.sent.borrow_mut().push(message.clone());
        match self.failure {
            Some(ref reason) => Err(TransportError(reason.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_support::ScratchDir;
    use pretty_assertions::assert_eq;

    fn message() -> OutgoingMessage {
        OutgoingMessage {
            to: "a@example.com,Bea <b@example.com>".into(),
            subject: "Hi".into(),
            headers: "From: me@example.com\r\nMIME-Version: 1.0".into(),
            body: "Hello".into(),
        }
    }

    #[test]
    fn test_formatted() {
        assert_eq!(
            message().formatted(),
            "To: a@example.com,Bea <b@example.com>\r\nSubject: Hi\r\nFrom: me@example.com\r\nMIME-Version: 1.0\r\n\r\nHello"
        );

        let bare = OutgoingMessage {
            headers: String::new(),
            subject: "R\u{e9}sum\u{e9}".into(),
            ..message()
        };
        assert_eq!(
            bare.formatted(),
            "To: a@example.com,Bea <b@example.com>\r\nSubject: =?UTF-8?Q?R=C3=A9sum=C3=A9?=\r\n\r\nHello"
        );
    }

    #[test]
    fn test_file_transport() {
        let dir = ScratchDir::new();
        let transport = FileTransport::new(dir.path());
        let file = transport.write(&message()).unwrap();
        assert_eq!(file.extension().and_then(|e| e.to_str()), Some("eml"));
        assert_eq!(std::fs::read_to_string(file).unwrap(), message().formatted());

        let broken = FileTransport::new(dir.path().join("no-such-dir"));
        assert!(broken.send(&message()).is_err());
    }

    #[test]
    fn test_stub_transport() {
        let ok = StubTransport::new_positive();
        assert!(ok.send(&message()).is_ok());
        assert_eq!(ok.messages(), vec![message()]);

        let failing = StubTransport::new_negative("mailbox full");
        assert_eq!(failing.send(&message()).unwrap_err().to_string(), "mailbox full");
        assert_eq!(failing.messages().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_sendmail_command() {
        let cat = SendmailTransport::new_with_command("cat").with_args(Vec::<String>::new());
        assert!(cat.send(&message()).is_ok());

        let missing = SendmailTransport::new_with_command("/nonexistent/sendmail");
        let err = missing.send(&message()).unwrap_err();
        assert!(err.to_string().contains("could not spawn"));

        let failing = SendmailTransport::new_with_command("false").with_args(Vec::<String>::new());
        assert!(failing.send(&message()).is_err());
    }
}
