//! Envelope addresses declared to the relay.

use crate::smtp::error::{self, Error};

/// The sender/recipient pair declared during the MAIL FROM / RCPT TO
/// phase, distinct from the header fields inside the message body.
///
/// Addresses are plain strings; beyond non-emptiness no validation is
/// performed here, the caller is expected to have vetted its input.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Envelope {
    from: String,
    to: String,
}

impl Envelope {
    /// Creates an envelope, rejecting empty addresses.
    pub fn new<S: Into<String>, T: Into<String>>(from: S, to: T) -> Result<Envelope, Error> {
        let from = from.into();
        let to = to.into();
        if from.is_empty() {
            return Err(error::client("missing sender address, invalid envelope"));
        }
        if to.is_empty() {
            return Err(error::client("missing recipient address, invalid envelope"));
        }
        Ok(Envelope { from, to })
    }

    /// Sender address (reverse-path)
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Recipient address (forward-path)
    pub fn to(&self) -> &str {
        &self.to
    }
}
