//! URL reference parsing
//!
//! A cross-entity pointer is a URL of the form `.../<type>/<id>`. Only the
//! trailing integer carries meaning. Anything else in the last segment is an
//! error, never coerced.

use std::fmt;
use std::str::FromStr;

/// A parsed URL reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlReference {
    kind: Option<String>,
    id: i64,
}

impl UrlReference {
    /// Parses a reference URL
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the final path segment is not an
    /// integer (this includes a trailing `/` and an empty string).
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::core::normalize::reference::UrlReference;
    ///
    /// let r = UrlReference::parse("https://rickandmortyapi.com/api/episode/28").unwrap();
    /// assert_eq!(r.id(), 28);
    /// assert_eq!(r.kind(), Some("episode"));
    ///
    /// assert!(UrlReference::parse("https://rickandmortyapi.com/api/episode/").is_err());
    /// ```
    pub fn parse(url: &str) -> Result<Self, String> {
        let (head, last) = match url.rsplit_once('/') {
            Some((head, last)) => (Some(head), last),
            None => (None, url),
        };

        let id = last
            .parse::<i64>()
            .map_err(|_| format!("trailing segment '{last}' of '{url}' is not an integer id"))?;

        let kind = head
            .and_then(|h| h.rsplit('/').next())
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(Self { kind, id })
    }

    /// The referenced id
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The path segment before the id, typically the referenced entity type
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }
}

impl FromStr for UrlReference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UrlReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{kind}/{}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}
