use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::Error;

use super::TokenPair;

/// Persistence for the token pair. `store_tokens` is called every time new tokens
/// are issued, before the call that obtained them returns.
pub trait TokenStore: Send + Sync {
    fn load_tokens(&self) -> Result<Option<TokenPair>, Error>;
    fn store_tokens(&self, tokens: &TokenPair) -> Result<(), Error>;
}

/// Plain JSON file. Not encrypted.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load_tokens(&self) -> Result<Option<TokenPair>, Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::Io(err)),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn store_tokens(&self, tokens: &TokenPair) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(tokens)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenPair>>,
    writes: Mutex<Vec<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every pair passed to `store_tokens`, oldest first.
    pub fn history(&self) -> Vec<TokenPair> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load_tokens(&self) -> Result<Option<TokenPair>, Error> {
        let guard = self
            .tokens
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("token store lock poisoned")))?;
        Ok(guard.clone())
    }

    fn store_tokens(&self, tokens: &TokenPair) -> Result<(), Error> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("token store lock poisoned")))?;
        *guard = Some(tokens.clone());
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(tokens.clone());
        }
        Ok(())
    }
}
