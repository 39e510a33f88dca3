use std::fmt;

use crate::{ContentId, Error, normalize_slug};

/// How a pull names the item to fetch from the source: numeric ID or slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceIdentifier {
    Id(ContentId),
    Slug(String),
}

impl SourceIdentifier {
    /// Parses user input. Positive integers are IDs, everything else is
    /// normalized into a slug.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<u64>() {
            if let Some(id) = ContentId::new(n) {
                return Ok(Self::Id(id));
            }
        }

        let slug = normalize_slug(trimmed);
        if slug.is_empty() {
            return Err(Error::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self::Slug(slug))
    }

    /// Returns the ID if this identifier is numeric.
    pub fn as_id(&self) -> Option<ContentId> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Slug(_) => None,
        }
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Slug(slug) => f.write_str(slug),
        }
    }
}
