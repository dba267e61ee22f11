//! Publication lifecycle of user-contributed content.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Status shared by memorials, memories and condolences.
///
/// Only [`ContentStatus::Published`] is terminal for cleanup purposes; every
/// other status counts as "not yet published".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentStatus {
    Draft,
    Published,
    InReview,
    Rejected,
    Removed,
}

impl ContentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::InReview => "in-review",
            ContentStatus::Rejected => "rejected",
            ContentStatus::Removed => "removed",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, ContentStatus::Published)
    }
}

impl FromStr for ContentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "in-review" => Ok(ContentStatus::InReview),
            "rejected" => Ok(ContentStatus::Rejected),
            "removed" => Ok(ContentStatus::Removed),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}
