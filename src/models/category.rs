//! Export categories and their identity rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A named group of records inside an export document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Profile,
    Multireddits,
    Subreddits,
    Saved,
    Upvoted,
    Downvoted,
    Comments,
    Submissions,
    Inbox,
}

impl Category {
    /// All categories, in the order they appear in an export document.
    pub const ALL: [Category; 9] = [
        Category::Profile,
        Category::Multireddits,
        Category::Subreddits,
        Category::Saved,
        Category::Upvoted,
        Category::Downvoted,
        Category::Comments,
        Category::Submissions,
        Category::Inbox,
    ];

    /// Key of this category in an export document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Profile => "profile",
            Category::Multireddits => "multireddits",
            Category::Subreddits => "subreddits",
            Category::Saved => "saved",
            Category::Upvoted => "upvoted",
            Category::Downvoted => "downvoted",
            Category::Comments => "comments",
            Category::Submissions => "submissions",
            Category::Inbox => "inbox",
        }
    }

    /// Field used to deduplicate records of this category.
    ///
    /// Multireddits have no stable `id`, so their `path` is used instead.
    pub fn identity_field(&self) -> &'static str {
        match self {
            Category::Multireddits => "path",
            _ => "id",
        }
    }

    /// Identity field for an arbitrary document key, `id` for unknown keys.
    pub fn identity_field_for(key: &str) -> &'static str {
        key.parse::<Category>()
            .map(|c| c.identity_field())
            .unwrap_or("id")
    }

    /// Whether stored records are ordered most-recent-action-first.
    ///
    /// The API returns listings newest first and exports keep that order,
    /// so these categories are reversed before accumulation.
    pub fn is_newest_first(&self) -> bool {
        !matches!(self, Category::Profile)
    }

    /// Whether the category holds a sequence of records rather than a single mapping.
    pub fn is_list(&self) -> bool {
        !matches!(self, Category::Profile)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown category: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_fields() {
        assert_eq!(Category::Saved.identity_field(), "id");
        assert_eq!(Category::Multireddits.identity_field(), "path");
        assert_eq!(Category::identity_field_for("multireddits"), "path");
        assert_eq!(Category::identity_field_for("something_new"), "id");
    }

    #[test]
    fn test_parse_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("karma".parse::<Category>().is_err());
    }

    #[test]
    fn test_profile_is_not_reversed() {
        assert!(!Category::Profile.is_newest_first());
        assert!(Category::Saved.is_newest_first());
        assert!(Category::Multireddits.is_newest_first());
    }
}
