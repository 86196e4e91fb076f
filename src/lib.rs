//! relaymail is a minimal synchronous SMTP submission client.
//!
//! It does one thing: open a connection to a mail relay, secure it,
//! authenticate, and hand over a single two-part (plain text + HTML)
//! message. There is no pooling, no pipelining and no retry logic;
//! every [`Mailer::send`] call performs one complete protocol run and
//! closes the connection, whatever the outcome.
//!
//! It implements the following extensions:
//!
//! * STARTTLS ([RFC 2487](https://tools.ietf.org/html/rfc2487))
//! * AUTH ([RFC 4954](https://tools.ietf.org/html/rfc4954)) with the LOGIN mechanism
//!
//! # Example
//!
//! ```rust,no_run
//! use relaymail::{Credentials, Mailbox, Mailer, Message};
//!
//! # fn main() -> Result<(), relaymail::Error> {
//! let message = Message::builder()
//!     .from("portfolio@example.com")
//!     .to("owner@example.com")
//!     .subject("New contact message")
//!     .reply_to(Mailbox::new(Some("Jane Doe".into()), "jane@example.org".into()))
//!     .text_body("Name: Jane\nMessage: hello")
//!     .html_body("<p><strong>Name:</strong> Jane</p><p>hello</p>")
//!     .build()?;
//!
//! let mailer = Mailer::starttls_relay("smtp.example.com")?
//!     .credentials(Credentials::new(
//!         "portfolio@example.com".into(),
//!         "app-password".into(),
//!     ))
//!     .build();
//!
//! mailer.send(&message)?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod address;
pub mod message;
pub mod smtp;

pub use crate::{
    address::Envelope,
    message::{Mailbox, Message, MessageBuilder},
    smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
        error::{Error, Stage},
        ClientId, Encryption, Mailer, MailerBuilder,
    },
};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
