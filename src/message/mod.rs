//! Message construction: headers plus a two-part alternative body.
//!
//! A [`Message`] always carries both a plain-text and an HTML rendering
//! of the same content, joined under a fresh random boundary every time
//! [`Message::formatted`] is called. Non-ASCII subjects and display
//! names are protected with RFC 2047 encoded words so 7-bit relays
//! cannot mangle them.

use std::fmt::{self, Display, Formatter};

use crate::{
    address::Envelope,
    smtp::error::{self, Error},
};

pub mod encoded_word;
mod mime;

/// An address with an optional display name, used for Reply-To
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Mailbox {
    /// The display name associated with the address
    pub name: Option<String>,
    /// The address itself
    pub email: String,
}

impl Mailbox {
    /// Creates a new mailbox
    pub fn new(name: Option<String>, email: String) -> Self {
        Mailbox { name, email }
    }

    /// Header rendering, with the display name wrapped in an encoded
    /// word when it contains non-ASCII text
    fn encoded(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", encoded_word::encode(name), self.email),
            None => format!("<{}>", self.email),
        }
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// A complete outgoing message
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Message {
    from: String,
    to: String,
    subject: String,
    text_body: String,
    html_body: String,
    reply_to: Option<Mailbox>,
}

impl Message {
    /// Creates a builder for the message
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// The envelope declared to the relay, derived from the sender and
    /// recipient headers
    pub fn envelope(&self) -> Result<Envelope, Error> {
        Envelope::new(self.from.as_str(), self.to.as_str())
    }

    /// Assembles the full payload written during the DATA phase:
    /// header block, blank line, multipart body.
    ///
    /// Each call draws a fresh boundary token.
    pub fn formatted(&self) -> Vec<u8> {
        let boundary = mime::make_boundary();

        let mut out = String::new();
        out.push_str(&format!("From: {}\r\n", self.from));
        out.push_str(&format!("To: {}\r\n", self.to));
        out.push_str(&format!(
            "Subject: {}\r\n",
            encoded_word::encode(&self.subject)
        ));
        out.push_str("MIME-Version: 1.0\r\n");
        if let Some(reply_to) = &self.reply_to {
            out.push_str(&format!("Reply-To: {}\r\n", reply_to.encoded()));
        }
        out.push_str(&format!(
            "Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n"
        ));
        out.push_str("\r\n");
        out.push_str(&mime::multipart_alternative(
            &boundary,
            &self.text_body,
            &self.html_body,
        ));
        out.into_bytes()
    }
}

/// Builder for [`Message`]
#[derive(Clone, Debug, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Option<String>,
    subject: String,
    text_body: String,
    html_body: String,
    reply_to: Option<Mailbox>,
}

impl MessageBuilder {
    /// Creates a new default builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender address
    pub fn from<S: Into<String>>(mut self, address: S) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Set the recipient address
    pub fn to<S: Into<String>>(mut self, address: S) -> Self {
        self.to = Some(address.into());
        self
    }

    /// Set the subject; may contain non-ASCII text
    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the Reply-To mailbox
    pub fn reply_to(mut self, mailbox: Mailbox) -> Self {
        self.reply_to = Some(mailbox);
        self
    }

    /// Set the plain-text rendering of the content
    pub fn text_body<S: Into<String>>(mut self, body: S) -> Self {
        self.text_body = body.into();
        self
    }

    /// Set the HTML rendering of the content
    pub fn html_body<S: Into<String>>(mut self, body: S) -> Self {
        self.html_body = body.into();
        self
    }

    /// Builds the message, requiring sender and recipient
    pub fn build(self) -> Result<Message, Error> {
        let from = self
            .from
            .ok_or_else(|| error::client("missing sender address"))?;
        let to = self
            .to
            .ok_or_else(|| error::client("missing recipient address"))?;

        Ok(Message {
            from,
            to,
            subject: self.subject,
            text_body: self.text_body,
            html_body: self.html_body,
            reply_to: self.reply_to,
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{encoded_word, Mailbox, Message};

    fn sample() -> Message {
        Message::builder()
            .from("portfolio@example.com")
            .to("owner@example.com")
            .subject("Test")
            .text_body("hello")
            .html_body("<p>hi</p>")
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_addresses() {
        assert!(Message::builder().to("a@example.com").build().is_err());
        assert!(Message::builder().from("a@example.com").build().is_err());
    }

    #[test]
    fn payload_has_both_parts_under_one_boundary() {
        let formatted = String::from_utf8(sample().formatted()).unwrap();

        let boundary = formatted
            .split("boundary=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .expect("content-type declares a boundary");
        assert!(boundary.starts_with("bnd_"));

        assert!(formatted.starts_with("From: portfolio@example.com\r\n"));
        assert!(formatted.contains("To: owner@example.com\r\n"));
        assert!(formatted.contains("Subject: Test\r\n"));
        assert!(formatted.contains("MIME-Version: 1.0\r\n"));
        assert!(formatted.contains(
            format!("Content-Type: multipart/alternative; boundary=\"{boundary}\"").as_str()
        ));
        assert!(formatted.contains(
            format!("--{boundary}\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\nhello\r\n")
                .as_str()
        ));
        assert!(formatted.contains(
            format!("--{boundary}\r\nContent-Type: text/html; charset=UTF-8\r\n\r\n<p>hi</p>\r\n")
                .as_str()
        ));
        assert!(formatted.ends_with(format!("--{boundary}--\r\n").as_str()));
    }

    #[test]
    fn fresh_boundary_per_invocation() {
        let message = sample();
        let first = String::from_utf8(message.formatted()).unwrap();
        let second = String::from_utf8(message.formatted()).unwrap();

        let extract = |payload: &str| {
            payload
                .split("boundary=\"")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .map(str::to_owned)
                .unwrap()
        };
        assert_ne!(extract(&first), extract(&second));
    }

    #[test]
    fn non_ascii_subject_is_encoded_and_recoverable() {
        let message = Message::builder()
            .from("a@example.com")
            .to("b@example.com")
            .subject("Grüße aus Köln")
            .build()
            .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        let subject_line = formatted
            .lines()
            .find(|line| line.starts_with("Subject: "))
            .unwrap();
        let value = &subject_line["Subject: ".len()..];

        assert!(value.starts_with("=?UTF-8?B?"));
        assert_eq!(encoded_word::decode(value), Some("Grüße aus Köln".into()));
    }

    #[test]
    fn reply_to_carries_encoded_display_name() {
        let message = Message::builder()
            .from("a@example.com")
            .to("b@example.com")
            .subject("s")
            .reply_to(Mailbox::new(Some("Łukasz".into()), "l@example.org".into()))
            .build()
            .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        let reply_line = formatted
            .lines()
            .find(|line| line.starts_with("Reply-To: "))
            .unwrap();

        assert!(reply_line.contains("<l@example.org>"));
        let name = reply_line["Reply-To: ".len()..]
            .split(" <")
            .next()
            .unwrap();
        assert_eq!(encoded_word::decode(name), Some("Łukasz".into()));
    }

    #[test]
    fn ascii_reply_to_passes_through() {
        let mailbox = Mailbox::new(Some("Jane Doe".into()), "jane@example.org".into());
        assert_eq!(mailbox.to_string(), "Jane Doe <jane@example.org>");

        let message = Message::builder()
            .from("a@example.com")
            .to("b@example.com")
            .reply_to(mailbox)
            .build()
            .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Reply-To: Jane Doe <jane@example.org>\r\n"));
    }

    #[test]
    fn envelope_derived_from_headers() {
        let envelope = sample().envelope().unwrap();
        assert_eq!(envelope.from(), "portfolio@example.com");
        assert_eq!(envelope.to(), "owner@example.com");
    }
}
