use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Takes precedence over the stored key when set.
pub const API_KEY_ENV: &str = "LINEAR_API_KEY";

/// Keyring entry the API key is stored under.
pub const KEYRING_SERVICE: &str = "git-linear";
pub const KEYRING_USER: &str = "api-key";

/// A single secret slot in some platform credential store.
pub trait SecretBackend: Send + Sync {
    fn set(&self, secret: &str) -> keyring::Result<()>;
    fn get(&self) -> keyring::Result<String>;
    fn delete(&self) -> keyring::Result<()>;
}

/// The OS keyring (Keychain, Credential Manager, Secret Service).
pub struct SystemKeyring {
    entry: keyring::Entry,
}

impl SystemKeyring {
    pub fn new() -> keyring::Result<Self> {
        Ok(Self {
            entry: keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?,
        })
    }
}

impl SecretBackend for SystemKeyring {
    fn set(&self, secret: &str) -> keyring::Result<()> {
        self.entry.set_password(secret)
    }

    fn get(&self) -> keyring::Result<String> {
        self.entry.get_password()
    }

    fn delete(&self) -> keyring::Result<()> {
        self.entry.delete_credential()
    }
}

/// How a keyring failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyringFailure {
    /// Nothing stored under the entry.
    Missing,
    /// No usable keyring on this machine (headless Linux, locked store).
    /// The key file is used instead.
    Unavailable,
    /// The keyring answered but the operation itself failed.
    Failed,
}

pub fn classify_keyring_error(error: &keyring::Error) -> KeyringFailure {
    match error {
        keyring::Error::NoEntry => KeyringFailure::Missing,
        keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
            KeyringFailure::Unavailable
        }
        _ => KeyringFailure::Failed,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialsFile {
    api_key: String,
}

/// The Linear API key. Lives in the OS keyring; falls back to a user-only
/// file under the base directory when no keyring can be reached.
pub struct CredentialStore {
    keyring: Option<Box<dyn SecretBackend>>,
    path: PathBuf,
}

impl CredentialStore {
    /// Store backed by the system keyring, with `path` as the fallback file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let keyring = match SystemKeyring::new() {
            Ok(keyring) => Some(Box::new(keyring) as Box<dyn SecretBackend>),
            Err(e) => {
                tracing::warn!(error = %e, "system keyring unavailable, using key file");
                None
            }
        };
        Self {
            keyring,
            path: path.into(),
        }
    }

    pub fn with_backend(backend: Box<dyn SecretBackend>, path: impl Into<PathBuf>) -> Self {
        Self {
            keyring: Some(backend),
            path: path.into(),
        }
    }

    /// Store that never touches a keyring.
    pub fn file_only(path: impl Into<PathBuf>) -> Self {
        Self {
            keyring: None,
            path: path.into(),
        }
    }

    /// Location of the fallback key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, api_key: &str) -> Result<()> {
        if let Some(keyring) = &self.keyring {
            match keyring.set(api_key) {
                Ok(()) => {
                    tracing::debug!("api key stored in system keyring");
                    // drop any key left over from a file fallback
                    return self.delete_file();
                }
                Err(e) => match classify_keyring_error(&e) {
                    KeyringFailure::Unavailable => {
                        tracing::warn!(
                            error = %e,
                            "system keyring unavailable, using key file"
                        );
                    }
                    KeyringFailure::Missing | KeyringFailure::Failed => {
                        return Err(e).context("failed to store API key in system keyring");
                    }
                },
            }
        }
        self.write_file(api_key)
    }

    /// The stored key, or `None` if nothing has been stored yet.
    pub fn get(&self) -> Result<Option<String>> {
        if let Some(keyring) = &self.keyring {
            match keyring.get() {
                Ok(key) => return Ok(non_empty(&key)),
                Err(e) => match classify_keyring_error(&e) {
                    KeyringFailure::Missing => {}
                    KeyringFailure::Unavailable => {
                        tracing::warn!(
                            error = %e,
                            "system keyring unavailable, reading key file"
                        );
                    }
                    KeyringFailure::Failed => {
                        return Err(e).context("failed to read API key from system keyring");
                    }
                },
            }
        }
        self.read_file()
    }

    /// Remove the stored key. A missing key is not an error.
    pub fn delete(&self) -> Result<()> {
        if let Some(keyring) = &self.keyring {
            if let Err(e) = keyring.delete() {
                match classify_keyring_error(&e) {
                    KeyringFailure::Missing => {}
                    KeyringFailure::Unavailable => {
                        tracing::warn!(
                            error = %e,
                            "system keyring unavailable, removing key file only"
                        );
                    }
                    KeyringFailure::Failed => {
                        return Err(e)
                            .context("failed to remove API key from system keyring");
                    }
                }
            }
        }
        self.delete_file()
    }

    pub fn has(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }

    /// Key from the environment if set, otherwise the stored one.
    pub fn resolve(&self) -> Result<Option<String>> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if let Some(key) = non_empty(&key) {
                return Ok(Some(key));
            }
        }
        self.get()
    }

    fn write_file(&self, api_key: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let contents = toml::to_string(&CredentialsFile {
            api_key: api_key.to_string(),
        })
        .context("failed to serialize credentials")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("failed to write {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("failed to restrict {}", self.path.display()))?;
        }

        tracing::debug!(path = %self.path.display(), "api key stored in key file");
        Ok(())
    }

    fn read_file(&self) -> Result<Option<String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };

        let file: CredentialsFile = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(non_empty(&file.api_key))
    }

    fn delete_file(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", self.path.display())),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}
