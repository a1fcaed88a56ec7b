use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use calshare_core::{Password, StateId};

/// Namespace of the per-identifier password keys.
pub const PASSWORD_KEY: &str = "calendar_state_password_";

/// Local record of the edit passwords this client was issued.
///
/// Holding a password only says this client created the entry. The server still
/// decides on every save.
pub trait PasswordStore {
    fn get(&self, id: &StateId) -> Option<Password>;
    fn set(&mut self, id: &StateId, password: &Password);
}

fn key(id: &StateId) -> String {
    format!("{PASSWORD_KEY}{id}")
}

#[derive(Debug, Default)]
pub struct MemoryPasswords {
    inner: HashMap<String, Password>,
}

impl MemoryPasswords {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordStore for MemoryPasswords {
    fn get(&self, id: &StateId) -> Option<Password> {
        self.inner.get(&key(id)).cloned()
    }

    fn set(&mut self, id: &StateId, password: &Password) {
        self.inner.insert(key(id), password.clone());
    }
}

/// Passwords kept in a JSON file. Storage failures are logged, never raised.
#[derive(Debug)]
pub struct FilePasswords {
    path: PathBuf,
    inner: BTreeMap<String, Password>,
}

impl FilePasswords {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let inner = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable password file {}: {err}", path.display());
                BTreeMap::new()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                log::warn!("Failed to read password file {}: {err}", path.display());
                BTreeMap::new()
            }
        };

        Self { path, inner }
    }

    fn persist(&self) -> io::Result<()> {
        let content = serde_json::to_string_pretty(&self.inner)?;
        fs::write(&self.path, content)
    }
}

impl PasswordStore for FilePasswords {
    fn get(&self, id: &StateId) -> Option<Password> {
        self.inner.get(&key(id)).cloned()
    }

    fn set(&mut self, id: &StateId, password: &Password) {
        self.inner.insert(key(id), password.clone());

        if let Err(err) = self.persist() {
            log::error!("Failed to write password file {}: {err}", self.path.display());
        }
    }
}
