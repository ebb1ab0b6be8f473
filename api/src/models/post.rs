use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: Uuid,
    pub text: String,
    /// Set once on insert, never touched by edits.
    pub pub_date: DateTime<Utc>,
    pub group_id: Option<i64>,
    /// Relative to the media root, e.g. `posts/small.gif`.
    pub image: Option<String>,
}

impl Post {
    /// Newest first; posts sharing a timestamp fall back to insertion order.
    pub fn newest_first(a: &Post, b: &Post) -> std::cmp::Ordering {
        b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id))
    }
}
