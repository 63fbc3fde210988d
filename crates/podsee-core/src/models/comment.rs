use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discussion comment. Replies carry the id of their top-level parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub centre_id: String,
    pub username: String,
    pub text: String,
    #[serde(default)]
    pub parent_comment_id: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
    /// Only populated by the `get_comments_with_reply_count` RPC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<i64>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }

    pub fn reply_count(&self) -> i64 {
        self.reply_count.unwrap_or(0)
    }
}

/// Insert payload for the `comments` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewComment<'a> {
    pub centre_id: &'a str,
    pub username: &'a str,
    pub text: &'a str,
    pub parent_comment_id: Option<&'a str>,
    pub hidden: bool,
}
