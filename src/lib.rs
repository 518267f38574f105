//! fluent-mailer — compose MIME email with a fluent builder and hand it to a
//! local mail transport.
//!
//! ```no_run
//! use fluent_mailer::{Attachment, BodyKind, BodySource, MessageBuilder, SendmailTransport};
//!
//! let mut message = MessageBuilder::new();
//! message
//!     .set_from("Reports <reports@example.com>")
//!     .set_subject("Weekly numbers")
//!     .add_to("ana@example.com", "Ana")
//!     .set_priority("high")
//!     .add_attachment(Attachment::new("/srv/reports/week.pdf"));
//! message.set_body("Hello {name}, numbers attached.", BodyKind::Plain, BodySource::File)?;
//! message.bind("{name}", "Ana");
//!
//! let delivered = message.send(&SendmailTransport::new())?;
//! # Ok::<(), fluent_mailer::MailerError>(())
//! ```

pub mod attachment;
pub mod config;
pub mod email;
pub mod errors;
pub mod fetch;
pub mod headers;
pub mod logger;
pub mod mime_types;
pub mod template;
pub mod transport;
pub mod utils;

// Re-exports
pub use attachment::{Attachment, Disposition};
pub use config::{MailerConfig, TransferEncoding};
pub use email::{BodyKind, BodySource, MessageBuilder, Priority, RecipientKind, UnknownPriority, UnknownRecipientKind};
pub use errors::{ConfigError, FetchError, FileNotFoundError, MailerError, TransportError};
pub use fetch::FetchOptions;
pub use headers::Headers;
pub use logger::{LogLevel, Logger};
pub use template::TemplateVars;
pub use transport::{FileTransport, OutgoingMessage, SendmailTransport, StubTransport, Transport};
