//! How and when the connection gets encrypted

use std::fmt::{self, Debug};

use native_tls::{Protocol, TlsConnector};

use crate::smtp::error::{self, Error};

/// Specifies how to establish a TLS connection.
#[derive(Clone)]
#[allow(missing_copy_implementations)]
pub enum Tls {
    /// Plaintext connection only, for trusted local relays
    None,
    /// Begin with a plaintext connection and require `STARTTLS` before
    /// credentials or content are transmitted
    Required(TlsParameters),
    /// Establish a connection wrapped in TLS from the start (implicit TLS)
    Wrapper(TlsParameters),
}

impl Debug for Tls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Self::None => f.pad("None"),
            Self::Required(_) => f.pad("Required"),
            Self::Wrapper(_) => f.pad("Wrapper"),
        }
    }
}

/// Parameters for a TLS-secured connection
#[derive(Clone)]
pub struct TlsParameters {
    connector: TlsConnector,
    domain: String,
}

impl TlsParameters {
    /// Creates default parameters for the given server name
    pub fn new(domain: String) -> Result<Self, Error> {
        Self::builder(domain).build()
    }

    /// Creates a new builder for `TlsParameters`
    pub fn builder(domain: String) -> TlsParametersBuilder {
        TlsParametersBuilder {
            domain,
            accept_invalid_certs: false,
            accept_invalid_hostnames: false,
        }
    }

    /// The server name the certificate is validated against
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub(crate) fn connector(&self) -> &TlsConnector {
        &self.connector
    }
}

impl Debug for TlsParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsParameters")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Builder for `TlsParameters`
#[derive(Clone, Debug)]
pub struct TlsParametersBuilder {
    domain: String,
    accept_invalid_certs: bool,
    accept_invalid_hostnames: bool,
}

impl TlsParametersBuilder {
    /// Controls whether invalid certificates are accepted
    ///
    /// Defaults to `false`. Enabling this exposes the connection to
    /// man-in-the-middle interception; only meant for test relays
    /// presenting self-signed certificates.
    pub fn dangerous_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Controls whether certificates with mismatched hostnames are accepted
    ///
    /// Defaults to `false`.
    pub fn dangerous_accept_invalid_hostnames(mut self, accept: bool) -> Self {
        self.accept_invalid_hostnames = accept;
        self
    }

    /// Builds the `TlsParameters`
    pub fn build(self) -> Result<TlsParameters, Error> {
        let mut tls_builder = TlsConnector::builder();
        tls_builder.min_protocol_version(Some(Protocol::Tlsv12));
        tls_builder.danger_accept_invalid_certs(self.accept_invalid_certs);
        tls_builder.danger_accept_invalid_hostnames(self.accept_invalid_hostnames);

        let connector = tls_builder.build().map_err(error::tls)?;
        Ok(TlsParameters {
            connector,
            domain: self.domain,
        })
    }
}
