//! The SMTP client layer.
//!
//! [`Mailer`] drives one complete protocol run per [`Mailer::send`]
//! call: connect, greeting, EHLO, optional STARTTLS, AUTH LOGIN,
//! envelope, DATA, QUIT, close. Every step must succeed before the
//! next begins; the first failure aborts the attempt and releases the
//! connection. Nothing is pooled or retried at this layer.

use std::{
    fmt::{self, Display, Formatter},
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
    time::Duration,
};

use crate::{
    message::Message,
    smtp::{
        authentication::Credentials,
        client::{SmtpConnection, Tls, TlsParameters},
        error::Error,
    },
};

pub mod authentication;
pub mod client;
pub mod commands;
pub mod error;
pub mod response;

/// Default smtp port
pub const SMTP_PORT: u16 = 25;
/// Default submission port
pub const SUBMISSION_PORT: u16 = 587;
/// Default submission over TLS port
pub const SUBMISSIONS_PORT: u16 = 465;

/// How long to wait for an individual read or write before the attempt
/// is aborted with a timeout failure
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

macro_rules! try_smtp (
    ($err: expr, $client: ident) => ({
        match $err {
            Ok(val) => val,
            Err(err) => {
                $client.abort();
                return Err(err);
            }
        }
    })
);

/// Identity advertised in the EHLO command
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum ClientId {
    /// A fully-qualified domain name
    Domain(String),
    /// An IPv4 address
    Ipv4(Ipv4Addr),
    /// An IPv6 address
    Ipv6(Ipv6Addr),
}

const LOCALHOST_CLIENT: ClientId = ClientId::Ipv4(Ipv4Addr::new(127, 0, 0, 1));

impl Default for ClientId {
    fn default() -> Self {
        // https://tools.ietf.org/html/rfc5321#section-4.1.4
        //
        // The EHLO parameter should be a primary host name; when the
        // client has no obvious name, an address literal is substituted.
        hostname::get()
            .ok()
            .and_then(|s| s.into_string().map(Self::Domain).ok())
            .unwrap_or(LOCALHOST_CLIENT)
    }
}

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(value) => f.write_str(value),
            Self::Ipv4(value) => write!(f, "[{value}]"),
            Self::Ipv6(value) => write!(f, "[IPv6:{value}]"),
        }
    }
}

/// Encryption mode selector, mirroring the usual `tls`/`ssl`
/// configuration strings of mail setups
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub enum Encryption {
    /// No encryption (plain connection)
    #[default]
    None,
    /// Plain connection upgraded with STARTTLS (`tls`)
    StartTls,
    /// Connection established already wrapped in TLS (`ssl`)
    Implicit,
}

impl FromStr for Encryption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "tls" => Ok(Encryption::StartTls),
            "ssl" => Ok(Encryption::Implicit),
            "" | "none" => Ok(Encryption::None),
            other => Err(error::client(format!("unknown encryption mode `{other}`"))),
        }
    }
}

/// Client configuration, fixed for the lifetime of one send attempt
#[derive(Clone, Debug)]
struct MailerInfo {
    /// Name sent during EHLO
    hello_name: ClientId,
    /// Server we are connecting to
    server: String,
    /// Port to connect to
    port: u16,
    /// TLS security configuration
    tls: Tls,
    /// Credentials for AUTH LOGIN; skipped entirely when absent
    credentials: Option<Credentials>,
    /// Network timeout applied to every read and write
    timeout: Option<Duration>,
}

impl Default for MailerInfo {
    fn default() -> Self {
        Self {
            server: "localhost".to_owned(),
            port: SUBMISSION_PORT,
            hello_name: ClientId::default(),
            credentials: None,
            timeout: Some(DEFAULT_TIMEOUT),
            tls: Tls::None,
        }
    }
}

/// Sends emails using the SMTP protocol
#[derive(Clone, Debug)]
pub struct Mailer {
    info: MailerInfo,
}

impl Mailer {
    /// Simple and secure transport, using a connection wrapped in TLS
    /// from the start, over the submissions port
    pub fn relay(relay: &str) -> Result<MailerBuilder, Error> {
        let tls_parameters = TlsParameters::new(relay.into())?;

        Ok(Self::builder(relay)
            .port(SUBMISSIONS_PORT)
            .tls(Tls::Wrapper(tls_parameters)))
    }

    /// Secure transport for servers that only take plain connections:
    /// connects in the clear, then requires STARTTLS before any
    /// credentials or content are sent
    pub fn starttls_relay(relay: &str) -> Result<MailerBuilder, Error> {
        let tls_parameters = TlsParameters::new(relay.into())?;

        Ok(Self::builder(relay)
            .port(SUBMISSION_PORT)
            .tls(Tls::Required(tls_parameters)))
    }

    /// Creates a builder from a host and an [`Encryption`] selector,
    /// the typed equivalent of a `tls`/`ssl` configuration string
    pub fn from_mode(server: &str, mode: Encryption) -> Result<MailerBuilder, Error> {
        match mode {
            Encryption::None => Ok(Self::builder(server).port(SMTP_PORT)),
            Encryption::StartTls => Self::starttls_relay(server),
            Encryption::Implicit => Self::relay(server),
        }
    }

    /// Creates a new builder with no encryption configured.
    ///
    /// Defaults: no authentication, no TLS, 20 second timeout, port 587.
    pub fn builder<T: Into<String>>(server: T) -> MailerBuilder {
        MailerBuilder {
            info: MailerInfo {
                server: server.into(),
                ..Default::default()
            },
        }
    }

    /// Performs one complete protocol run delivering `message` to the
    /// relay. Either every step succeeds and the message is handed
    /// over, or the attempt fails once; the connection is closed on
    /// every exit path and never reused.
    pub fn send(&self, message: &Message) -> Result<(), Error> {
        let envelope = message.envelope()?;
        let email = message.formatted();

        let mut conn = self.connection()?;
        if let Some(credentials) = &self.info.credentials {
            try_smtp!(conn.auth_login(credentials), conn);
        }
        try_smtp!(conn.send(&envelope, &email), conn);
        let _ = conn.quit();
        conn.close();
        Ok(())
    }

    /// Connects, validates the greeting and secures the session
    /// according to the configured mode
    fn connection(&self) -> Result<SmtpConnection, Error> {
        let tls_parameters = match &self.info.tls {
            Tls::Wrapper(parameters) => Some(parameters),
            _ => None,
        };

        let mut conn = SmtpConnection::connect(
            &self.info.server,
            self.info.port,
            self.info.timeout,
            &self.info.hello_name,
            tls_parameters,
        )?;

        if let Tls::Required(parameters) = &self.info.tls {
            try_smtp!(conn.starttls(parameters, &self.info.hello_name), conn);
        }

        Ok(conn)
    }
}

/// Contains client configuration.
///
/// Instances of this struct are created using functions of [`Mailer`].
#[derive(Clone, Debug)]
pub struct MailerBuilder {
    info: MailerInfo,
}

impl MailerBuilder {
    /// Set the name used during EHLO
    pub fn hello_name(mut self, name: ClientId) -> Self {
        self.info.hello_name = name;
        self
    }

    /// Set the credentials for AUTH LOGIN
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.info.credentials = Some(credentials);
        self
    }

    /// Set the timeout duration
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.info.timeout = timeout;
        self
    }

    /// Set the port to use
    pub fn port(mut self, port: u16) -> Self {
        self.info.port = port;
        self
    }

    /// Set the TLS settings to use
    pub fn tls(mut self, tls: Tls) -> Self {
        self.info.tls = tls;
        self
    }

    /// Build the Mailer
    pub fn build(self) -> Mailer {
        Mailer { info: self.info }
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::{ClientId, Encryption};

    #[test]
    fn encryption_mode_strings() {
        assert_eq!(Encryption::from_str("tls").unwrap(), Encryption::StartTls);
        assert_eq!(Encryption::from_str("ssl").unwrap(), Encryption::Implicit);
        assert_eq!(Encryption::from_str("").unwrap(), Encryption::None);
        assert_eq!(Encryption::from_str("none").unwrap(), Encryption::None);
        assert!(Encryption::from_str("starttls").is_err());
    }

    #[test]
    fn client_id_display() {
        assert_eq!(ClientId::Domain("mail.example.com".into()).to_string(), "mail.example.com");
        assert_eq!(
            ClientId::Ipv4(std::net::Ipv4Addr::new(127, 0, 0, 1)).to_string(),
            "[127.0.0.1]"
        );
    }
}
