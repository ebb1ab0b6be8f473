use crate::{
    forms::{CommentForm, FieldErrors, PostFormValues},
    models::{Group, User},
    pagination::Page,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
    pub redirect_to: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub action: &'static str,
    pub next: String,
}

/// Public face of a user; no email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for AuthorRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

impl From<&Group> for GroupRef {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            title: group.title.clone(),
            slug: group.slug.clone(),
        }
    }
}

/// A post joined with its author, group and comment count.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
    pub comment_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: AuthorRef,
}

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub page_obj: Page<PostView>,
    pub is_index: bool,
}

#[derive(Debug, Serialize)]
pub struct GroupPage {
    pub group: Group,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub author: AuthorRef,
    pub posts_count: usize,
    pub following: bool,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct FollowPage {
    pub page_obj: Page<PostView>,
    pub is_follow_index: bool,
}

#[derive(Debug, Serialize)]
pub struct PostDetailPage {
    pub post: PostView,
    pub author_posts_count: usize,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
}

/// The create/edit form, blank, pre-filled, or bounced back with errors.
#[derive(Debug, Serialize)]
pub struct PostFormPage {
    pub form: PostFormValues,
    pub groups: Vec<GroupRef>,
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
}
