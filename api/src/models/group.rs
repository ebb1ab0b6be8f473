use serde::{Deserialize, Serialize};

/// A community posts can be filed under. `slug` is unique across groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}
