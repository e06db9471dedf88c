//! Core data types for release browsing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// A canonical `owner/name` pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCoordinate {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoCoordinate {
    /// Creates a coordinate from owner and name parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoCoordinate {
    type Err = ResolveError;

    /// Parses `owner/name`, splitting on the first `/`.
    ///
    /// Both sides must be non-empty and the owner side must not carry
    /// registry-only characters (a leading `@` marks an npm scope, not a
    /// repository owner).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .split_once('/')
            .ok_or_else(|| ResolveError::InvalidIdentifier(s.to_string()))?;
        if owner.is_empty() || name.is_empty() || owner.starts_with('@') {
            return Err(ResolveError::InvalidIdentifier(s.to_string()));
        }
        Ok(Self::new(owner, name))
    }
}

/// One entry of a repository's release list.
///
/// Entries arrive reverse-chronological by creation time, at most one page
/// per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSummary {
    /// Git tag the release was published from (e.g., "v3.4.0").
    pub tag_name: String,
    /// Browser URL of the release page.
    pub url: String,
    /// Publication timestamp, if the release has been published.
    pub published_at: Option<DateTime<Utc>>,
    /// Whether this is the repository's latest stable release.
    pub is_latest: bool,
    /// Whether the release is marked as a prerelease.
    pub is_prerelease: bool,
}

/// A single release with its markdown body, fetched for the selected entry.
///
/// Replaced wholesale on each new selection, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDetail {
    /// The summary fields for this release.
    pub summary: ReleaseSummary,
    /// Release notes as raw markdown.
    pub description: String,
    /// Login of the user who published the release.
    pub author_login: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_parses_owner_and_name() {
        let coord: RepoCoordinate = "vuejs/core".parse().unwrap();
        assert_eq!(coord.owner, "vuejs");
        assert_eq!(coord.name, "core");
    }

    #[test]
    fn coordinate_splits_on_first_separator() {
        let coord: RepoCoordinate = "a/b/c".parse().unwrap();
        assert_eq!(coord.owner, "a");
        assert_eq!(coord.name, "b/c");
    }

    #[test]
    fn coordinate_rejects_empty_sides() {
        assert!("vuejs/".parse::<RepoCoordinate>().is_err());
        assert!("/core".parse::<RepoCoordinate>().is_err());
        assert!("vue".parse::<RepoCoordinate>().is_err());
    }

    #[test]
    fn coordinate_rejects_scoped_package_names() {
        // "@vue/cli" is an npm scope, not a repository owner
        assert!("@vue/cli".parse::<RepoCoordinate>().is_err());
    }

    #[test]
    fn coordinate_displays_as_owner_slash_name() {
        let coord = RepoCoordinate::new("vercel", "next.js");
        assert_eq!(coord.to_string(), "vercel/next.js");
    }
}
