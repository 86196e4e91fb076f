//! SMTP client, one connection per send attempt

use std::{
    fmt::Display,
    io::{BufRead, BufReader, Write},
    net::Shutdown,
    time::Duration,
};

use crate::{
    address::Envelope,
    smtp::{
        authentication::Credentials,
        commands::{AuthLogin, AuthResponse, Data, Ehlo, Mail, Quit, Rcpt, Starttls},
        error::{self, Error, Stage},
        response::{parse_response, Response},
        ClientId,
    },
};

pub mod mock;
mod net;
mod tls;

pub use self::{
    net::NetworkStream,
    tls::{Tls, TlsParameters, TlsParametersBuilder},
};

/// The codec used for transparency: any payload line starting with a
/// period gets it doubled, so user text can never terminate DATA early.
#[derive(Clone, Copy, Debug)]
pub struct ClientCodec {
    escape_count: u8,
}

impl Default for ClientCodec {
    fn default() -> Self {
        ClientCodec::new()
    }
}

impl ClientCodec {
    /// Creates a new client codec.
    ///
    /// Starts as if a CRLF had just been seen, so a frame whose very
    /// first byte is a period is escaped too.
    pub fn new() -> Self {
        ClientCodec { escape_count: 2 }
    }

    /// Adds transparency
    fn encode(&mut self, frame: &[u8], buf: &mut Vec<u8>) {
        let mut start = 0;
        for (idx, byte) in frame.iter().enumerate() {
            match self.escape_count {
                0 => self.escape_count = u8::from(*byte == b'\r'),
                1 => self.escape_count = if *byte == b'\n' { 2 } else { 0 },
                2 => self.escape_count = if *byte == b'.' { 3 } else { 0 },
                _ => unreachable!(),
            }
            if self.escape_count == 3 {
                self.escape_count = 0;
                buf.extend_from_slice(&frame[start..idx]);
                buf.extend_from_slice(b".");
                start = idx;
            }
        }
        buf.extend_from_slice(&frame[start..]);
    }
}

/// Returns the string replacing all the CRLF with "\<CRLF\>"
///
/// Used for debug displays
fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}

/// Structure that implements the SMTP client.
///
/// Owned exclusively by one send attempt; never reused after
/// completion. The stream is shut down on every exit path.
pub struct SmtpConnection {
    /// Stream between client and server
    stream: BufReader<NetworkStream>,
    /// Whether QUIT has already been sent
    sent_quit: bool,
}

impl SmtpConnection {
    /// Connects to the configured server and validates its greeting.
    ///
    /// With `tls_parameters` set the connection is established already
    /// wrapped in TLS (implicit mode). Sends EHLO before returning.
    pub fn connect(
        server: &str,
        port: u16,
        timeout: Option<Duration>,
        hello_name: &ClientId,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<SmtpConnection, Error> {
        let stream = NetworkStream::connect(server, port, timeout, tls_parameters)?;
        let mut conn = SmtpConnection::new(stream);
        conn.set_timeout(timeout).map_err(error::network)?;
        if let Err(err) = conn.handshake(hello_name) {
            conn.abort();
            return Err(err);
        }
        Ok(conn)
    }

    /// Wraps an already-established stream
    pub fn new(stream: NetworkStream) -> SmtpConnection {
        SmtpConnection {
            stream: BufReader::new(stream),
            sent_quit: false,
        }
    }

    /// Reads the server greeting and sends the initial EHLO
    pub fn handshake(&mut self, hello_name: &ClientId) -> Result<(), Error> {
        let greeting = self.read_response()?;
        if !greeting.has_code(220) {
            return Err(error::unexpected(Stage::Greeting, &greeting));
        }
        self.ehlo(hello_name)?;
        Ok(())
    }

    /// Upgrades the connection with STARTTLS.
    ///
    /// The EHLO is re-issued over the secured stream: capability
    /// answers given over the insecure channel are not trusted.
    pub fn starttls(
        &mut self,
        tls_parameters: &TlsParameters,
        hello_name: &ClientId,
    ) -> Result<(), Error> {
        self.command(Starttls, 220, Stage::StartTls)?;
        self.stream.get_mut().upgrade_tls(tls_parameters)?;
        tracing::debug!("connection encrypted");
        self.ehlo(hello_name)?;
        Ok(())
    }

    /// Performs the AUTH LOGIN exchange.
    ///
    /// Each step fails with its own stage, so a rejected username and a
    /// rejected password are distinguishable even though the server
    /// prompts themselves are opaque base64 text.
    pub fn auth_login(&mut self, credentials: &Credentials) -> Result<(), Error> {
        self.command(AuthLogin, 334, Stage::AuthChallenge)?;
        self.command(AuthResponse::new(credentials.user()), 334, Stage::AuthUser)?;
        self.command(
            AuthResponse::new(credentials.secret()),
            235,
            Stage::AuthPassword,
        )?;
        Ok(())
    }

    /// Declares the envelope and submits the message content
    pub fn send(&mut self, envelope: &Envelope, email: &[u8]) -> Result<Response, Error> {
        self.command(Mail::new(envelope.from()), 250, Stage::MailFrom)?;
        self.command(Rcpt::new(envelope.to()), 250, Stage::RcptTo)?;
        self.command(Data, 354, Stage::Data)?;
        self.message(email)
    }

    /// Sends the message content followed by the end-of-data marker
    pub fn message(&mut self, message: &[u8]) -> Result<Response, Error> {
        let mut codec = ClientCodec::new();
        let mut out_buf = Vec::with_capacity(message.len());
        codec.encode(message, &mut out_buf);
        self.write(&out_buf)?;
        self.write(b"\r\n.\r\n")?;

        let response = self.read_response()?;
        if response.has_code(250) {
            Ok(response)
        } else {
            Err(error::unexpected(Stage::DataEnd, &response))
        }
    }

    /// Sends QUIT without waiting for the acknowledgment; the stream is
    /// closed right after regardless of what the server answers
    pub fn quit(&mut self) -> Result<(), Error> {
        self.sent_quit = true;
        self.write(Quit.to_string().as_bytes())
    }

    /// Best-effort QUIT, then releases the stream
    pub fn abort(&mut self) {
        if !self.sent_quit {
            let _ = self.quit();
        }
        self.close();
    }

    /// Shuts the stream down
    pub fn close(&mut self) {
        let _ = self.stream.get_mut().shutdown(Shutdown::Both);
    }

    /// Tells if the underlying stream is currently encrypted
    pub fn is_encrypted(&self) -> bool {
        self.stream.get_ref().is_encrypted()
    }

    /// Set timeout
    pub fn set_timeout(&mut self, duration: Option<Duration>) -> std::io::Result<()> {
        self.stream.get_mut().set_read_timeout(duration)?;
        self.stream.get_mut().set_write_timeout(duration)
    }

    /// Send EHLO
    fn ehlo(&mut self, hello_name: &ClientId) -> Result<(), Error> {
        self.command(Ehlo::new(hello_name.clone()), 250, Stage::Ehlo)?;
        Ok(())
    }

    /// Sends an SMTP command and matches the reply against the code
    /// expected at this stage
    pub fn command<C: Display>(
        &mut self,
        command: C,
        expected_code: u16,
        stage: Stage,
    ) -> Result<Response, Error> {
        self.write(command.to_string().as_bytes())?;
        let response = self.read_response()?;
        if response.has_code(expected_code) {
            Ok(response)
        } else {
            Err(error::unexpected(stage, &response))
        }
    }

    /// Writes a string to the server
    fn write(&mut self, string: &[u8]) -> Result<(), Error> {
        self.stream
            .get_mut()
            .write_all(string)
            .map_err(error::network)?;
        self.stream.get_mut().flush().map_err(error::network)?;

        tracing::debug!(">> {}", escape_crlf(&String::from_utf8_lossy(string)));
        Ok(())
    }

    /// Reads one logical reply, accumulating physical lines until the
    /// parser no longer asks for more input
    pub fn read_response(&mut self) -> Result<Response, Error> {
        let mut buffer = String::with_capacity(100);

        while self
            .stream
            .read_line(&mut buffer)
            .map_err(error::network)?
            > 0
        {
            tracing::debug!("<< {}", escape_crlf(&buffer));
            match parse_response(&buffer) {
                Ok((_remaining, response)) => return Ok(response),
                Err(nom::Err::Incomplete(_)) => { /* read more */ }
                Err(nom::Err::Failure(e)) | Err(nom::Err::Error(e)) => {
                    return Err(error::response(e.to_string()));
                }
            }
        }

        Err(error::response("incomplete response"))
    }
}
