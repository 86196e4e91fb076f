//! The underlying byte stream, plain or encrypted

use std::{
    fmt::{self, Debug, Formatter},
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::TlsStream;

use crate::smtp::{
    client::mock::MockStream,
    client::TlsParameters,
    error::{self, Error},
};

/// Represents the different types of underlying network streams
pub enum NetworkStream {
    /// Plain TCP stream
    Tcp(TcpStream),
    /// Encrypted TCP stream
    Tls(Box<TlsStream<TcpStream>>),
    /// Scripted stream for tests
    Mock(MockStream),
}

impl Debug for NetworkStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkStream::Tcp(_) => "NetworkStream::Tcp",
            NetworkStream::Tls(_) => "NetworkStream::Tls",
            NetworkStream::Mock(_) => "NetworkStream::Mock",
        })
    }
}

impl NetworkStream {
    /// Opens a connection to the given server.
    ///
    /// With `tls_parameters` set the TLS handshake is performed
    /// immediately after connecting (implicit TLS); otherwise a plain
    /// stream is returned. The timeout bounds the connection attempt.
    pub fn connect(
        server: &str,
        port: u16,
        timeout: Option<Duration>,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<NetworkStream, Error> {
        fn try_connect(addr: &SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
            match timeout {
                Some(duration) => TcpStream::connect_timeout(addr, duration),
                None => TcpStream::connect(addr),
            }
        }

        let addrs = (server, port).to_socket_addrs().map_err(error::connect)?;
        let mut last_err = None;

        for addr in addrs {
            match try_connect(&addr, timeout) {
                Ok(stream) => {
                    return match tls_parameters {
                        Some(parameters) => {
                            let tls_stream = parameters
                                .connector()
                                .connect(parameters.domain(), stream)
                                .map_err(error::tls)?;
                            Ok(NetworkStream::Tls(Box::new(tls_stream)))
                        }
                        None => Ok(NetworkStream::Tcp(stream)),
                    };
                }
                Err(err) => last_err = Some(err),
            }
        }

        Err(match last_err {
            Some(err) => error::connect(err),
            None => error::connect("could not resolve to any address"),
        })
    }

    /// Upgrades the plain stream to TLS in place (STARTTLS).
    ///
    /// A failure here is a transport/cryptographic failure, not a
    /// server refusal; it surfaces as a TLS error.
    pub fn upgrade_tls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        *self = match self {
            NetworkStream::Tcp(stream) => {
                let tcp_stream = stream.try_clone().map_err(error::network)?;
                let tls_stream = tls_parameters
                    .connector()
                    .connect(tls_parameters.domain(), tcp_stream)
                    .map_err(error::tls)?;
                NetworkStream::Tls(Box::new(tls_stream))
            }
            NetworkStream::Tls(_) => return Ok(()),
            NetworkStream::Mock(stream) => {
                if stream.tls_upgrade_fails() {
                    return Err(error::tls("scripted handshake failure"));
                }
                return Ok(());
            }
        };

        Ok(())
    }

    /// Tells if the stream is currently encrypted
    pub fn is_encrypted(&self) -> bool {
        match self {
            NetworkStream::Tcp(_) => false,
            NetworkStream::Tls(_) => true,
            NetworkStream::Mock(_) => false,
        }
    }

    /// Shuts down the connection
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        match self {
            NetworkStream::Tcp(stream) => stream.shutdown(how),
            NetworkStream::Tls(stream) => stream.get_ref().shutdown(how),
            NetworkStream::Mock(_) => Ok(()),
        }
    }

    /// Set read timeout for IO calls
    pub fn set_read_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match self {
            NetworkStream::Tcp(stream) => stream.set_read_timeout(duration),
            NetworkStream::Tls(stream) => stream.get_ref().set_read_timeout(duration),
            NetworkStream::Mock(_) => Ok(()),
        }
    }

    /// Set write timeout for IO calls
    pub fn set_write_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match self {
            NetworkStream::Tcp(stream) => stream.set_write_timeout(duration),
            NetworkStream::Tls(stream) => stream.get_ref().set_write_timeout(duration),
            NetworkStream::Mock(_) => Ok(()),
        }
    }
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            NetworkStream::Tcp(stream) => stream.read(buf),
            NetworkStream::Tls(stream) => stream.read(buf),
            NetworkStream::Mock(stream) => stream.read(buf),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            NetworkStream::Tcp(stream) => stream.write(buf),
            NetworkStream::Tls(stream) => stream.write(buf),
            NetworkStream::Mock(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            NetworkStream::Tcp(stream) => stream.flush(),
            NetworkStream::Tls(stream) => stream.flush(),
            NetworkStream::Mock(stream) => stream.flush(),
        }
    }
}
