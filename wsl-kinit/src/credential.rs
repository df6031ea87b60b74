#[cfg(windows)]
mod credman;
mod memory_data;

#[cfg(windows)]
pub use self::credman::WindowsCredentialManager;
pub use self::memory_data::MemoryVault;
use crate::{Error, Principal};
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

/// A generic vault entry: the username it is filed under and its password.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    password: Zeroizing<String>,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Takes a password that is already held in wiped storage.
    pub fn with_password(username: impl Into<String>, password: Zeroizing<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read-only access to the host's generic credentials, keyed by a target
/// string and a username.
pub trait CredentialVault {
    /// Returns the first entry filed under `target` whose username equals
    /// `username`, or `None` when there is no such entry.
    fn lookup(&self, target: &str, username: &str) -> anyhow::Result<Option<Credential>>;
}

impl<V: CredentialVault + ?Sized> CredentialVault for &V {
    fn lookup(&self, target: &str, username: &str) -> anyhow::Result<Option<Credential>> {
        (**self).lookup(target, username)
    }
}

/// Finds the password for `principal`, filed under its realm.
pub fn resolve<V: CredentialVault + ?Sized>(
    vault: &V,
    principal: &Principal,
) -> anyhow::Result<Credential> {
    debug!(
        target_name = %principal.realm,
        username = %principal.username,
        "looking up generic credential"
    );
    vault
        .lookup(&principal.realm, &principal.username)?
        .ok_or_else(|| {
            Error::CREDENTIAL_MISSING.with_detail(format!(
                "Please create a generic windows credential with '{}' as the target address, \
                 '{}' as the username, and the password for krb5 authentication",
                principal.realm, principal.username
            ))
        })
}

/// The vault of the machine this process runs on.
pub struct HostVault {
    #[cfg(windows)]
    inner: WindowsCredentialManager,
}

impl HostVault {
    pub fn open() -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(windows)]
            inner: WindowsCredentialManager::new(),
        })
    }
}

impl CredentialVault for HostVault {
    #[cfg(windows)]
    fn lookup(&self, target: &str, username: &str) -> anyhow::Result<Option<Credential>> {
        self.inner.lookup(target, username)
    }

    #[cfg(not(windows))]
    fn lookup(&self, _target: &str, _username: &str) -> anyhow::Result<Option<Credential>> {
        Err(Error::VAULT_UNAVAILABLE
            .with_detail("generic credentials are only available on a Windows host"))
    }
}
