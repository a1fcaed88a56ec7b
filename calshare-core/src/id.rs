use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[cfg(feature = "generate")]
const ID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

#[cfg(feature = "generate")]
const ID_LEN: usize = 10;

/// Identifier naming a stored configuration, used in the shareable URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidId;

/// Token proving edit rights for one [`StateId`].
///
/// Compared by plain equality and held in client-side storage. It only keeps
/// casual visitors from overwriting a shared link and is not authentication.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl StateId {
    #[cfg(feature = "generate")]
    #[must_use]
    pub fn generate() -> Self {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        // byte 6 carries the uuid version nibble
        let id = bytes
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != 6)
            .take(ID_LEN)
            .map(|(_, byte)| byte)
            .map(|byte| ID_ALPHABET[usize::from(byte & 63)] as char)
            .collect();
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StateId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(InvalidId);
        }
        Ok(Self(value))
    }
}

impl FromStr for StateId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<StateId> for String {
    fn from(id: StateId) -> Self {
        id.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for InvalidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("identifier must not be empty")
    }
}

impl std::error::Error for InvalidId {}

impl Password {
    #[cfg(feature = "generate")]
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(..)")
    }
}
