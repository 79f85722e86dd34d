//! Moderation item entity
//!
//! One piece of queued content (submission or comment) awaiting review.

use serde::{Deserialize, Serialize};

/// Kind of queued content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Submission,
    Comment,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemType::Submission => write!(f, "submission"),
            ItemType::Comment => write!(f, "comment"),
        }
    }
}

/// Which queued items a run should look at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemTypeFilter {
    #[default]
    All,
    Submissions,
    Comments,
}

impl ItemTypeFilter {
    pub fn matches(&self, item_type: ItemType) -> bool {
        match self {
            ItemTypeFilter::All => true,
            ItemTypeFilter::Submissions => item_type == ItemType::Submission,
            ItemTypeFilter::Comments => item_type == ItemType::Comment,
        }
    }
}

impl std::fmt::Display for ItemTypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemTypeFilter::All => write!(f, "all"),
            ItemTypeFilter::Submissions => write!(f, "submissions"),
            ItemTypeFilter::Comments => write!(f, "comments"),
        }
    }
}

impl std::str::FromStr for ItemTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ItemTypeFilter::All),
            "submissions" | "submission" | "posts" | "links" => Ok(ItemTypeFilter::Submissions),
            "comments" | "comment" => Ok(ItemTypeFilter::Comments),
            _ => Err(format!("Unknown item type filter: {}", s)),
        }
    }
}

/// A queued submission or comment
///
/// Created by the platform adapter per run and consumed once by the
/// moderation service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationItem {
    /// Platform id without type prefix (e.g. `abc123`)
    pub id: String,
    /// Opaque platform handle used for actions (e.g. `t3_abc123`)
    pub fullname: String,
    pub item_type: ItemType,
    /// Submission title; `None` for comments
    pub title: Option<String>,
    /// Self text for submissions, comment body for comments
    pub body_text: String,
    /// `None` when the account was deleted
    pub author: Option<String>,
    pub subreddit: String,
    pub url: Option<String>,
    pub domain: Option<String>,
    /// Title of the submission a comment belongs to
    pub link_title: Option<String>,
}

impl ModerationItem {
    pub fn is_submission(&self) -> bool {
        self.item_type == ItemType::Submission
    }

    /// Short human-readable label for logs
    pub fn label(&self) -> String {
        match &self.title {
            Some(title) if self.is_submission() => title.clone(),
            _ => truncate_chars(&self.body_text, 50),
        }
    }
}

/// Truncate to `max` characters, appending "..." when shortened.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}
