//! Interned channel identifiers.
//!
//! A [`ChannelId`] names one scalar component of a multi-channel field or raster.
//! Identifiers are interned in a process-wide table: constructing the same name twice,
//! from any thread, yields the same token, and equality/hashing compare token identity
//! rather than string contents.
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{OnceLock, RwLock};

use tracing::trace;

use crate::error::{Error, Result};

/// Cheap, copyable identifier for a channel.
#[derive(Clone, Copy)]
pub struct ChannelId(&'static str);

fn table() -> &'static RwLock<HashMap<&'static str, ChannelId>> {
    static TABLE: OnceLock<RwLock<HashMap<&'static str, ChannelId>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns `true` if `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn intern(name: &str) -> ChannelId {
    {
        let guard = table().read().unwrap_or_else(|e| e.into_inner());
        if let Some(id) = guard.get(name) {
            return *id;
        }
    }

    let mut guard = table().write().unwrap_or_else(|e| e.into_inner());
    // Another thread may have won the race between the two locks.
    if let Some(id) = guard.get(name) {
        return *id;
    }
    let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
    let id = ChannelId(leaked);
    guard.insert(leaked, id);
    trace!("Interned channel '{}'.", leaked);
    id
}

impl ChannelId {
    /// Interns `name` and returns its canonical token.
    ///
    /// Fails with [`Error::InvalidIdentifier`] if the name is not a valid identifier.
    pub fn new(name: &str) -> Result<Self> {
        if !is_valid_identifier(name) {
            return Err(Error::InvalidIdentifier {
                name: name.to_owned(),
            });
        }

        Ok(intern(name))
    }

    /// Looks up an already interned identifier without creating it.
    pub fn lookup(name: &str) -> Option<Self> {
        let guard = table().read().unwrap_or_else(|e| e.into_inner());
        guard.get(name).copied()
    }

    /// The identifier's name.
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Interns the four conventional color channels `r`, `g`, `b`, `a`.
    pub fn rgba() -> [ChannelId; 4] {
        ["r", "g", "b", "a"].map(intern)
    }
}

impl PartialEq for ChannelId {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for ChannelId {}

impl Hash for ChannelId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0.as_ptr() as usize).hash(state);
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl AsRef<str> for ChannelId {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl TryFrom<&str> for ChannelId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        ChannelId::new(value)
    }
}

impl std::str::FromStr for ChannelId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ChannelId::new(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ChannelId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ChannelId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        ChannelId::new(&name).map_err(serde::de::Error::custom)
    }
}
