use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: Option<i64>,
    pub author_id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}
