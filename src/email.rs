//! Message building and MIME assembly.

use crate::attachment::Attachment;
use crate::config::{MailerConfig, TransferEncoding};
use crate::errors::MailerError;
use crate::fetch::{self, FetchOptions};
use crate::headers::Headers;
use crate::logger::Logger;
use crate::template::{self, TemplateVars};
use crate::transport::{OutgoingMessage, Transport};
use crate::utils::{encode_base64_lines, encode_quoted_printable, format_address, generate_safe_boundary, word_wrap, CRLF};
use std::fmt;
use std::path::Path;

/// Message urgency, written to `X-Priority`, `X-MSMail-Priority` and `Importance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    fn header_values(self) -> (&'static str, &'static str) {
        match self {
            Priority::High => ("1", "High"),
            Priority::Normal => ("3", "Normal"),
            Priority::Low => ("5", "Low"),
        }
    }
}

/// Input that names no known priority level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority level {0}")]
pub struct UnknownPriority(pub String);

impl TryFrom<&str> for Priority {
    type Error = UnknownPriority;

    fn try_from(level: &str) -> Result<Self, Self::Error> {
        match level.trim().to_ascii_lowercase().as_str() {
            "high" | "1" => Ok(Priority::High),
            "normal" | "3" => Ok(Priority::Normal),
            "low" | "5" => Ok(Priority::Low),
            _ => Err(UnknownPriority(level.to_string())),
        }
    }
}

impl TryFrom<i32> for Priority {
    type Error = UnknownPriority;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Priority::High),
            3 => Ok(Priority::Normal),
            5 => Ok(Priority::Low),
            _ => Err(UnknownPriority(level.to_string())),
        }
    }
}

/// Which recipient header an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
}

/// Input that names no known recipient kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown recipient kind {0}")]
pub struct UnknownRecipientKind(pub String);

impl TryFrom<&str> for RecipientKind {
    type Error = UnknownRecipientKind;

    fn try_from(kind: &str) -> Result<Self, Self::Error> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "to" => Ok(RecipientKind::To),
            "cc" => Ok(RecipientKind::Cc),
            "bcc" => Ok(RecipientKind::Bcc),
            _ => Err(UnknownRecipientKind(kind.to_string())),
        }
    }
}

/// Content type of the message body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// `text/plain`, word-wrapped when a wrap width is configured.
    #[default]
    Plain,
    /// `text/html`.
    Html,
    /// Any other content type, used as given.
    Custom(String),
}

impl BodyKind {
    pub fn parse(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "plain" => BodyKind::Plain,
            "html" => BodyKind::Html,
            _ => BodyKind::Custom(kind.to_string()),
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            BodyKind::Plain => "text/plain",
            BodyKind::Html => "text/html",
            BodyKind::Custom(mime) => mime,
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_type())
    }
}

/// Where `set_body` content comes from when it is not literal text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BodySource {
    /// Content naming an existing file is replaced by the file's bytes.
    #[default]
    File,
    /// Content naming an existing file is rendered as a `{{ name }}` template.
    Template(TemplateVars),
    /// `http(s)://` content is fetched; an existing file path is read.
    Url(Option<FetchOptions>),
}

/// Fluent builder for a single email message.
///
/// Headers keep insertion order; recipients, bindings and attachments are
/// rendered in the order they were added.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    headers: Headers,
    recipients: Vec<(String, RecipientKind)>,
    attachments: Vec<Attachment>,
    replacements: Vec<(String, String)>,
    word_wrap: usize,
    charset: String,
    content_type: String,
    encoding: TransferEncoding,
    boundary: String,
    subject: String,
    body: String,
    logger: Logger,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::with_config(MailerConfig::default())
    }

    pub fn with_config(config: MailerConfig) -> Self {
        let mut builder = Self {
            headers: Headers::new(),
            recipients: Vec::new(),
            attachments: Vec::new(),
            replacements: Vec::new(),
            word_wrap: config.word_wrap,
            charset: config.charset.clone(),
            content_type: String::new(),
            encoding: config.transfer_encoding,
            boundary: generate_safe_boundary("mixed_"),
            subject: String::new(),
            body: String::new(),
            logger: Logger::new(config.log_level, format!("[{}]", env!("CARGO_PKG_NAME"))),
        };

        builder.set_from(config.sender());
        builder.set_header("MIME-Version", "1.0");
        if let Some(ref mailer) = config.x_mailer {
            builder.set_header("X-Mailer", mailer.as_str());
        }
        builder.set_content_type("text/plain", false);
        builder
    }

    /// Sets a header, replacing an existing one of the same name in place.
    /// Empty names are ignored.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        if !self.headers.set(name, value) {
            self.logger.debug("ignoring header with empty name");
        }
        self
    }

    pub fn unset_header(&mut self, name: &str) -> &mut Self {
        self.headers.remove(name);
        self
    }

    /// Sets both `From` and `Return-Path`.
    pub fn set_from(&mut self, address: impl Into<String>) -> &mut Self {
        let address = address.into();
        self.set_header("From", address.clone());
        self.set_header("Return-Path", address)
    }

    pub fn set_reply_to(&mut self, address: impl Into<String>) -> &mut Self {
        self.set_header("Reply-To", address)
    }

    /// Asks the recipient's client for a read receipt sent to `address`.
    pub fn set_delivery_receipt(&mut self, address: impl Into<String>) -> &mut Self {
        self.set_header("Disposition-Notification-To", address)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = subject.into();
        self
    }

    /// Wrap column for plain-text bodies; 0 disables wrapping.
    pub fn set_word_wrap(&mut self, width: usize) -> &mut Self {
        self.word_wrap = width;
        self
    }

    /// Charset used the next time the content type is rendered.
    pub fn set_charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = charset.into();
        self
    }

    pub fn set_transfer_encoding(&mut self, encoding: TransferEncoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    /// Records the body content type and writes the `Content-Type` header.
    ///
    /// Once an attachment has been added the header stays
    /// `multipart/mixed` unless `force` is set; the type is still used for the
    /// main body part.
    pub fn set_content_type(&mut self, content_type: &str, force: bool) -> &mut Self {
        self.content_type = content_type.to_string();
        if self.attachments.is_empty() || force {
            let value = format!("{}; charset=\"{}\"", content_type, self.charset);
            self.set_header("Content-Type", value);
        }
        self
    }

    /// Sets all three priority headers. Unknown levels leave them untouched.
    pub fn set_priority<P: TryInto<Priority>>(&mut self, level: P) -> &mut Self {
        let Ok(priority) = level.try_into() else {
            self.logger.debug("ignoring unknown priority level");
            return self;
        };
        let (x_priority, importance) = priority.header_values();
        self.set_header("X-Priority", x_priority);
        self.set_header("X-MSMail-Priority", importance);
        self.set_header("Importance", importance)
    }

    /// Sets the message body.
    ///
    /// When `content` names something `source` can load (an existing file, or
    /// an `http(s)` URL for [`BodySource::Url`]) the loaded text becomes the
    /// body; otherwise `content` itself does. Plain bodies are word-wrapped and
    /// the content type is updated to match `kind`.
    pub fn set_body(&mut self, content: &str, kind: BodyKind, source: BodySource) -> Result<&mut Self, MailerError> {
        let mut body = self.load_body(content, &source)?;
        if kind == BodyKind::Plain && self.word_wrap > 0 {
            body = word_wrap(&body, self.word_wrap);
        }
        self.set_content_type(kind.content_type(), false);
        self.body = body;
        Ok(self)
    }

    fn load_body(&self, content: &str, source: &BodySource) -> Result<String, MailerError> {
        if content.is_empty() {
            return Ok(String::new());
        }
        if let BodySource::Url(options) = source {
            if fetch::is_url(content) {
                self.logger.debug(&format!("fetching body from {}", content));
                let default = FetchOptions::default();
                return Ok(fetch::fetch_url(content, options.as_ref().unwrap_or(&default))?);
            }
        }

        let path = Path::new(content);
        if !path.is_file() {
            return Ok(content.to_string());
        }
        self.logger.debug(&format!("loading body from {}", path.display()));
        match source {
            BodySource::Template(vars) => {
                let rendered = template::render_file(path, vars)?;
                let unresolved = template::placeholders(&rendered);
                if !unresolved.is_empty() {
                    self.logger.debug(&format!("unresolved template placeholders: {}", unresolved.join(", ")));
                }
                Ok(rendered)
            }
            BodySource::File | BodySource::Url(_) => {
                let bytes = std::fs::read(path)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }

    /// Replaces every occurrence of `token` in the body when the message is
    /// built. Binding the same token again replaces its value.
    pub fn bind(&mut self, token: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let token = token.into();
        let value = value.into();
        match self.replacements.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.replacements.push((token, value)),
        }
        self
    }

    pub fn add_to(&mut self, address: &str, name: &str) -> &mut Self {
        self.add_recipient(address, name, RecipientKind::To)
    }

    pub fn add_cc(&mut self, address: &str, name: &str) -> &mut Self {
        self.add_recipient(address, name, RecipientKind::Cc)
    }

    pub fn add_bcc(&mut self, address: &str, name: &str) -> &mut Self {
        self.add_recipient(address, name, RecipientKind::Bcc)
    }

    /// Adds `address` (as `"name <address>"` when a name is given). Adding the
    /// same formatted address again moves it to the new kind. Empty addresses
    /// and unknown kinds are ignored.
    pub fn add_recipient<K: TryInto<RecipientKind>>(&mut self, address: &str, name: &str, kind: K) -> &mut Self {
        if address.is_empty() {
            self.logger.debug("ignoring empty recipient address");
            return self;
        }
        let Ok(kind) = kind.try_into() else {
            self.logger.debug(&format!("ignoring recipient {} with unknown kind", address));
            return self;
        };
        let formatted = format_address(address, name);
        match self.recipients.iter_mut().find(|(a, _)| *a == formatted) {
            Some(entry) => entry.1 = kind,
            None => self.recipients.push((formatted, kind)),
        }
        self
    }

    /// Appends an attachment. The first one switches `Content-Type` to
    /// `multipart/mixed` with this message's boundary.
    pub fn add_attachment(&mut self, attachment: Attachment) -> &mut Self {
        if self.attachments.is_empty() {
            let value = format!("multipart/mixed; boundary={}", self.boundary);
            self.set_header("Content-Type", value);
        }
        self.attachments.push(attachment);
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Body as set, before bindings are applied.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content type of the main body.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Formatted addresses of `kind`, in the order they were first added.
    pub fn recipients(&self, kind: RecipientKind) -> Vec<&str> {
        self.recipients
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(address, _)| address.as_str())
            .collect()
    }

    /// Body with every binding applied, in binding order.
    pub fn replaced_body(&self) -> String {
        self.replacements
            .iter()
            .fold(self.body.clone(), |body, (token, value)| {
                if token.is_empty() {
                    body
                } else {
                    body.replace(token.as_str(), value)
                }
            })
    }

    /// `name: value` header lines joined by CRLF.
    pub fn build_headers(&self) -> String {
        self.headers.render(CRLF)
    }

    /// The message body. Without attachments this is the body with bindings
    /// applied; with attachments it is a `multipart/mixed` body holding the
    /// main part followed by one base64 part per attachment.
    pub fn build_body(&self) -> Result<String, MailerError> {
        let body = self.replaced_body();
        if self.attachments.is_empty() {
            return Ok(body);
        }

        let delimiter = format!("--{}", self.boundary);
        let mut parts = vec![
            delimiter.clone(),
            format!("Content-Type: {}; charset={}", self.content_type, self.charset),
            format!("Content-Transfer-Encoding: {}", self.encoding),
            String::new(),
            self.encode_main_part(&body),
            String::new(),
            String::new(),
        ];

        for attachment in &self.attachments {
            let mime = attachment.mime()?.unwrap_or_default();
            let name = attachment.name();
            parts.push(delimiter.clone());
            parts.push(format!("Content-Type: {}; name=\"{}\"", mime, name));
            parts.push(format!("Content-Disposition: {}; filename=\"{}\"", attachment.mode(), name));
            parts.push("Content-Transfer-Encoding: base64".to_string());
            parts.push(String::new());
            parts.push(attachment.data()?);
            parts.push(String::new());
        }
        parts.push(format!("{}--", delimiter));

        Ok(parts.join(CRLF))
    }

    fn encode_main_part(&self, body: &str) -> String {
        match self.encoding {
            TransferEncoding::QuotedPrintable => encode_quoted_printable(body, 76),
            TransferEncoding::Base64 => encode_base64_lines(body.as_bytes()),
            TransferEncoding::SevenBit | TransferEncoding::EightBit | TransferEncoding::Binary => body.to_string(),
        }
    }

    /// Assembles the message as it would be handed to a transport. The `Cc`
    /// and `Bcc` headers follow the current recipient lists and are removed
    /// when a list is empty.
    pub fn build(&mut self) -> Result<OutgoingMessage, MailerError> {
        let to = self.recipients(RecipientKind::To).join(",");
        let cc = self.recipients(RecipientKind::Cc).join(",");
        let bcc = self.recipients(RecipientKind::Bcc).join(",");

        for (name, list) in [("Cc", cc), ("Bcc", bcc)] {
            if list.is_empty() {
                self.unset_header(name);
            } else {
                self.set_header(name, list);
            }
        }

        Ok(OutgoingMessage {
            to,
            subject: self.subject.clone(),
            body: self.build_body()?,
            headers: self.build_headers(),
        })
    }

    /// Builds the message and hands it to `transport`.
    ///
    /// Returns `Ok(false)` if the transport rejected the message. Errors are
    /// reserved for building it, such as a missing attachment file.
    pub fn send<T: Transport>(&mut self, transport: &T) -> Result<bool, MailerError> {
        let message = self.build()?;
        self.logger.info(&format!(
            "sending \"{}\" to {} recipient(s), {} attachment(s)",
            self.subject,
            self.recipients.len(),
            self.attachments.len()
        ));
        match transport.send(&message) {
            Ok(()) => Ok(true),
            Err(e) => {
                self.logger.warn(&format!("transport failed: {}", e));
                Ok(false)
            }
        }
    }
}
