//! Identifier types used throughout the content sync core.
//!
//! Source and destination repositories number their content independently,
//! so identifiers are only meaningful on the side that issued them. Both
//! types are strictly positive: `0` is the "unset" sentinel on the wire and
//! is represented as `None` in Rust.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Identifier of a content item (page, post, custom type) in one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ContentId(u64);

impl ContentId {
    /// Creates a content ID, returning `None` for the `0` sentinel.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Returns the raw numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Parses a content ID from a string.
    pub fn parse(s: &str) -> Result<Self, Error> {
        s.parse()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidId(s.to_string()))?;
        Self::try_from(raw)
    }
}

impl TryFrom<u64> for ContentId {
    type Error = Error;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(Error::ZeroId)
    }
}

impl From<ContentId> for u64 {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

/// Identifier of a stored file asset (attachment) in one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct FileId(u64);

impl FileId {
    /// Creates a file ID, returning `None` for the `0` sentinel.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Returns the raw numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidId(s.to_string()))?;
        Self::try_from(raw)
    }
}

impl TryFrom<u64> for FileId {
    type Error = Error;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(Error::ZeroId)
    }
}

impl From<FileId> for u64 {
    fn from(id: FileId) -> Self {
        id.0
    }
}
