//! Error and result type for the SMTP client

use std::{error::Error as StdError, fmt};

use crate::{smtp::response::Response, BoxError};

// Inspired by https://github.com/seanmonstar/reqwest/blob/master/src/error.rs

/// The errors that may occur while sending an email over SMTP.
///
/// The [`Display`](fmt::Display) output always starts with a stage tag
/// (`connect failed`, `STARTTLS`, `PASS`, `DATA end`, ...) so operators
/// can tell from the message alone which step of the protocol run went
/// wrong. For unexpected replies the full server text is kept verbatim.
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

/// The protocol step an unexpected server reply was received at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Stage {
    /// The initial 220 greeting
    Greeting,
    /// EHLO (both before and after STARTTLS)
    Ehlo,
    /// The STARTTLS request itself (a refusal, not a handshake failure)
    StartTls,
    /// AUTH LOGIN, waiting for the username challenge
    AuthChallenge,
    /// The base64 username line
    AuthUser,
    /// The base64 password line
    AuthPassword,
    /// MAIL FROM
    MailFrom,
    /// RCPT TO
    RcptTo,
    /// DATA
    Data,
    /// The reply after the end-of-data marker
    DataEnd,
}

impl Stage {
    fn tag(self) -> &'static str {
        match self {
            Stage::Greeting => "greeting",
            Stage::Ehlo => "EHLO",
            Stage::StartTls => "STARTTLS",
            Stage::AuthChallenge => "AUTH",
            Stage::AuthUser => "USER",
            Stage::AuthPassword => "PASS",
            Stage::MailFrom => "MAIL FROM",
            Stage::RcptTo => "RCPT TO",
            Stage::Data => "DATA",
            Stage::DataEnd => "DATA end",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    /// The server replied, but not with the code expected at this stage
    Unexpected(Stage),
    /// Error establishing the TCP connection
    Connect,
    /// TLS handshake failure, distinct from a server refusing STARTTLS
    Tls,
    /// Underlying network i/o error, including read timeouts
    Network,
    /// Error parsing a reply
    Response,
    /// Internal client error (invalid message or envelope)
    Client,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    /// The protocol stage that returned an unexpected reply, if any
    pub fn stage(&self) -> Option<Stage> {
        match self.inner.kind {
            Kind::Unexpected(stage) => Some(stage),
            _ => None,
        }
    }

    /// Returns true if the error comes from the TLS handshake
    pub fn is_tls(&self) -> bool {
        matches!(self.inner.kind, Kind::Tls)
    }

    /// Returns true if the error comes from establishing the connection
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect)
    }

    /// Returns true if the server rejected one of the AUTH LOGIN steps
    pub fn is_auth(&self) -> bool {
        matches!(
            self.stage(),
            Some(Stage::AuthChallenge | Stage::AuthUser | Stage::AuthPassword)
        )
    }

    /// Returns true if the error is caused by an idle timeout
    pub fn is_timeout(&self) -> bool {
        let mut source = self.source();

        while let Some(err) = source {
            if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
                // read timeouts surface as WouldBlock on unix sockets
                return matches!(
                    io_err.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                );
            }

            source = err.source();
        }

        false
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("relaymail::smtp::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Unexpected(stage) => f.write_str(stage.tag())?,
            Kind::Connect => f.write_str("connect failed")?,
            Kind::Tls => f.write_str("TLS negotiation failed")?,
            Kind::Network => f.write_str("network error")?,
            Kind::Response => f.write_str("response error")?,
            Kind::Client => f.write_str("internal client error")?,
        };

        if let Some(ref e) = self.inner.source {
            write!(f, ": {e}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| {
            let r: &(dyn StdError + 'static) = &**e;
            r
        })
    }
}

pub(crate) fn unexpected(stage: Stage, reply: &Response) -> Error {
    Error::new(Kind::Unexpected(stage), Some(reply.to_string()))
}

pub(crate) fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connect, Some(e))
}

pub(crate) fn tls<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Tls, Some(e))
}

pub(crate) fn network<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Network, Some(e))
}

pub(crate) fn response<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Response, Some(e))
}

pub(crate) fn client<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Client, Some(e))
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;
    use crate::smtp::response::Response;

    #[test]
    fn unexpected_reply_keeps_server_text() {
        let reply = Response::from_str("535 5.7.8 Username and Password not accepted\r\n").unwrap();
        let err = unexpected(Stage::AuthPassword, &reply);

        assert_eq!(err.stage(), Some(Stage::AuthPassword));
        assert!(err.is_auth());
        assert_eq!(
            err.to_string(),
            "PASS: 535 5.7.8 Username and Password not accepted"
        );
    }

    #[test]
    fn tls_failure_is_not_a_reply_mismatch() {
        let err = tls("handshake interrupted");

        assert!(err.is_tls());
        assert_eq!(err.stage(), None);
        assert_eq!(err.to_string(), "TLS negotiation failed: handshake interrupted");
    }

    #[test]
    fn timeout_detected_through_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::WouldBlock, "timed out");
        let err = network(io_err);

        assert!(err.is_timeout());
    }
}
