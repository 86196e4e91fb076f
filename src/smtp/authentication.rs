//! Credentials for the AUTH LOGIN exchange

use std::fmt::{self, Debug, Formatter};

/// Contains user credentials.
///
/// Opaque to the protocol layer beyond being base64-transmitted;
/// the `Debug` output never includes the secret.
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct Credentials {
    authentication_identity: String,
    secret: String,
}

impl Credentials {
    /// Create a `Credentials` struct from username and password
    pub fn new(username: String, password: String) -> Credentials {
        Credentials {
            authentication_identity: username,
            secret: password,
        }
    }

    pub(crate) fn user(&self) -> &str {
        &self.authentication_identity
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl<S, T> From<(S, T)> for Credentials
where
    S: Into<String>,
    T: Into<String>,
{
    fn from((username, password): (S, T)) -> Self {
        Credentials::new(username.into(), password.into())
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish()
    }
}
