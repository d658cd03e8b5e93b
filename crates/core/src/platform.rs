//! Platform tags naming the build target (e.g. `heroku-18`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of the target execution environment.
///
/// The tag selects both the archive to download and the vendor
/// sub-directory, so it is restricted to ASCII letters, digits, `.`, `_`
/// and `-`, and may not be `.` or `..`. A tag can therefore never address
/// a path outside its own sub-tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlatformTag(String);

impl PlatformTag {
    /// Validate and wrap a platform tag.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for empty tags, `.`/`..`, or tags
    /// with characters outside `[A-Za-z0-9._-]`.
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(Error::configuration_with_help(
                "platform tag is empty",
                "Set STACK to the target platform, e.g. heroku-18",
            ));
        }
        if tag == "." || tag == ".." {
            return Err(Error::configuration(format!(
                "platform tag '{tag}' is not allowed"
            )));
        }
        if let Some(bad) = tag
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(Error::configuration(format!(
                "platform tag '{tag}' contains invalid character {bad:?}"
            )));
        }
        Ok(Self(tag))
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PlatformTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for PlatformTag {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PlatformTag> for String {
    fn from(tag: PlatformTag) -> Self {
        tag.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_stack_names() {
        for tag in ["heroku-18", "heroku-24", "cedar-14", "scalingo_22", "v1.2"] {
            assert_eq!(PlatformTag::new(tag).unwrap().as_str(), tag);
        }
    }

    #[test]
    fn test_rejects_path_like_tags() {
        for tag in ["", ".", "..", "../etc", "heroku/18", "a\\b", "heroku 18", "tag\0"] {
            let err = PlatformTag::new(tag).unwrap_err();
            assert!(err.is_configuration(), "{tag:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_and_display() {
        let tag: PlatformTag = "heroku-20".parse().unwrap();
        assert_eq!(tag.to_string(), "heroku-20");
    }

    #[test]
    fn test_serde_validates() {
        let tag: PlatformTag = serde_json::from_str("\"heroku-22\"").unwrap();
        assert_eq!(tag.as_str(), "heroku-22");
        assert!(serde_json::from_str::<PlatformTag>("\"../x\"").is_err());
    }
}
