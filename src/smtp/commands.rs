//! SMTP commands

use std::fmt::{self, Display, Formatter};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::smtp::ClientId;

/// EHLO command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Ehlo {
    client_id: ClientId,
}

impl Display for Ehlo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "EHLO {}\r\n", self.client_id)
    }
}

impl Ehlo {
    /// Creates a EHLO command
    pub fn new(client_id: ClientId) -> Ehlo {
        Ehlo { client_id }
    }
}

/// STARTTLS command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Starttls;

impl Display for Starttls {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("STARTTLS\r\n")
    }
}

/// AUTH LOGIN command, requesting the username/password challenges
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct AuthLogin;

impl Display for AuthLogin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("AUTH LOGIN\r\n")
    }
}

/// A base64-encoded credential line answering a 334 challenge.
///
/// No `Debug` on purpose, the payload is a username or password.
pub struct AuthResponse<'a> {
    payload: &'a str,
}

impl<'a> AuthResponse<'a> {
    /// Creates a challenge answer from the raw credential
    pub fn new(payload: &'a str) -> AuthResponse<'a> {
        AuthResponse { payload }
    }
}

impl Display for AuthResponse<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", BASE64.encode(self.payload))
    }
}

/// MAIL command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Mail {
    sender: String,
}

impl Display for Mail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MAIL FROM:<{}>\r\n", self.sender)
    }
}

impl Mail {
    /// Creates a MAIL command
    pub fn new<S: Into<String>>(sender: S) -> Mail {
        Mail {
            sender: sender.into(),
        }
    }
}

/// RCPT command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Rcpt {
    recipient: String,
}

impl Display for Rcpt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "RCPT TO:<{}>\r\n", self.recipient)
    }
}

impl Rcpt {
    /// Creates an RCPT command
    pub fn new<S: Into<String>>(recipient: S) -> Rcpt {
        Rcpt {
            recipient: recipient.into(),
        }
    }
}

/// DATA command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Data;

impl Display for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DATA\r\n")
    }
}

/// QUIT command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Quit;

impl Display for Quit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("QUIT\r\n")
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn command_lines_are_crlf_terminated() {
        assert_eq!(Ehlo::new(ClientId::Domain("example.com".into())).to_string(), "EHLO example.com\r\n");
        assert_eq!(Starttls.to_string(), "STARTTLS\r\n");
        assert_eq!(AuthLogin.to_string(), "AUTH LOGIN\r\n");
        assert_eq!(Mail::new("a@example.com").to_string(), "MAIL FROM:<a@example.com>\r\n");
        assert_eq!(Rcpt::new("b@example.org").to_string(), "RCPT TO:<b@example.org>\r\n");
        assert_eq!(Data.to_string(), "DATA\r\n");
        assert_eq!(Quit.to_string(), "QUIT\r\n");
    }

    #[test]
    fn auth_response_is_base64() {
        assert_eq!(AuthResponse::new("alice").to_string(), "YWxpY2U=\r\n");
        assert_eq!(AuthResponse::new("wonderland").to_string(), "d29uZGVybGFuZA==\r\n");
    }
}
