//! In-memory relational layer.
//!
//! Every table is a `DashMap` keyed by primary key, with secondary indexes for
//! the unique columns (email, username, group slug). Foreign-key behaviour is
//! applied by hand in the delete paths:
//!
//! - user → posts, comments, follow edges: cascade
//! - post → comments: cascade
//! - group → posts: set null

use crate::models::{Comment, Follow, Group, Post, User};
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("email {0} is already registered")]
    EmailTaken(String),
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("group slug {0} is already in use")]
    SlugTaken(String),
}

/// Fields of a post that a form is allowed to set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Default)]
pub struct Store {
    users: DashMap<Uuid, User>,
    email_index: DashMap<String, Uuid>,
    username_index: DashMap<String, Uuid>,
    groups: DashMap<i64, Group>,
    slug_index: DashMap<String, i64>,
    posts: DashMap<i64, Post>,
    comments: DashMap<i64, Comment>,
    follows: DashMap<(Uuid, Uuid), Follow>,
    group_seq: AtomicI64,
    post_seq: AtomicI64,
    comment_seq: AtomicI64,
}

fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::Relaxed) + 1
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub fn create_user(
        &self,
        email: &str,
        username: &str,
        hashed_password: String,
    ) -> Result<User, StoreError> {
        let id = Uuid::new_v4();

        match self.email_index.entry(email.to_string()) {
            Entry::Occupied(_) => return Err(StoreError::EmailTaken(email.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        match self.username_index.entry(username.to_string()) {
            Entry::Occupied(_) => {
                self.email_index.remove(email);
                return Err(StoreError::UsernameTaken(username.to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let user = User {
            id,
            email: email.to_string(),
            username: username.to_string(),
            hashed_password,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn user(&self, id: &Uuid) -> Option<User> {
        self.users.get(id).map(|u| u.clone())
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let id = *self.email_index.get(email)?;
        self.user(&id)
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        let id = *self.username_index.get(username)?;
        self.user(&id)
    }

    /// Removes the user together with everything they own.
    pub fn delete_user(&self, id: &Uuid) -> bool {
        let Some((_, user)) = self.users.remove(id) else {
            return false;
        };
        self.email_index.remove(&user.email);
        self.username_index.remove(&user.username);

        let owned_posts: Vec<i64> = self
            .posts
            .iter()
            .filter(|p| p.author_id == *id)
            .map(|p| p.id)
            .collect();
        for post_id in owned_posts {
            self.delete_post(post_id);
        }

        self.comments.retain(|_, c| c.author_id != *id);
        self.follows
            .retain(|(follower, author), _| follower != id && author != id);
        true
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub fn create_group(
        &self,
        title: &str,
        slug: &str,
        description: &str,
    ) -> Result<Group, StoreError> {
        let id = match self.slug_index.entry(slug.to_string()) {
            Entry::Occupied(_) => return Err(StoreError::SlugTaken(slug.to_string())),
            Entry::Vacant(slot) => *slot.insert(next_id(&self.group_seq)),
        };

        let group = Group {
            id,
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        };
        self.groups.insert(id, group.clone());
        Ok(group)
    }

    pub fn group(&self, id: i64) -> Option<Group> {
        self.groups.get(&id).map(|g| g.clone())
    }

    pub fn group_by_slug(&self, slug: &str) -> Option<Group> {
        let id = *self.slug_index.get(slug)?;
        self.group(id)
    }

    /// Ordered by title, the way the post form lists its choices.
    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.groups.iter().map(|g| g.clone()).collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        groups
    }

    /// Posts of a deleted group stay, detached.
    pub fn delete_group(&self, id: i64) -> bool {
        let Some((_, group)) = self.groups.remove(&id) else {
            return false;
        };
        self.slug_index.remove(&group.slug);
        for mut post in self.posts.iter_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub fn create_post(&self, author_id: Uuid, draft: PostDraft) -> Post {
        let post = Post {
            id: next_id(&self.post_seq),
            author_id,
            text: draft.text,
            pub_date: Utc::now(),
            group_id: draft.group_id,
            image: draft.image,
        };
        self.posts.insert(post.id, post.clone());
        post
    }

    pub fn post(&self, id: i64) -> Option<Post> {
        self.posts.get(&id).map(|p| p.clone())
    }

    /// Overwrites the editable fields, keeping author and `pub_date`.
    pub fn update_post(&self, id: i64, draft: PostDraft) -> Option<Post> {
        let mut post = self.posts.get_mut(&id)?;
        post.text = draft.text;
        post.group_id = draft.group_id;
        post.image = draft.image;
        Some(post.clone())
    }

    pub fn delete_post(&self, id: i64) -> bool {
        if self.posts.remove(&id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.post_id != Some(id));
        true
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    fn select_posts(&self, filter: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        posts.sort_by(Post::newest_first);
        posts
    }

    pub fn posts(&self) -> Vec<Post> {
        self.select_posts(|_| true)
    }

    pub fn posts_in_group(&self, group_id: i64) -> Vec<Post> {
        self.select_posts(|p| p.group_id == Some(group_id))
    }

    pub fn posts_by_author(&self, author_id: &Uuid) -> Vec<Post> {
        self.select_posts(|p| p.author_id == *author_id)
    }

    /// Posts written by anyone `user_id` follows.
    pub fn posts_followed_by(&self, user_id: &Uuid) -> Vec<Post> {
        let authors: HashSet<Uuid> = self
            .follows
            .iter()
            .filter(|edge| edge.user_id == *user_id)
            .map(|edge| edge.author_id)
            .collect();
        if authors.is_empty() {
            return Vec::new();
        }
        self.select_posts(|p| authors.contains(&p.author_id))
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    pub fn create_comment(&self, post_id: i64, author_id: Uuid, text: String) -> Comment {
        let comment = Comment {
            id: next_id(&self.comment_seq),
            post_id: Some(post_id),
            author_id,
            text,
            pub_date: Utc::now(),
        };
        self.comments.insert(comment.id, comment.clone());
        comment
    }

    pub fn comments_for_post(&self, post_id: i64) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.post_id == Some(post_id))
            .map(|c| c.clone())
            .collect();
        comments.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        comments
    }

    pub fn comment_count_for_post(&self, post_id: i64) -> usize {
        self.comments
            .iter()
            .filter(|c| c.post_id == Some(post_id))
            .count()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    // ------------------------------------------------------------------
    // Follow edges
    // ------------------------------------------------------------------

    /// Returns `true` when a new edge was stored. Self-follows and repeats
    /// are no-ops.
    pub fn follow(&self, user_id: Uuid, author_id: Uuid) -> bool {
        if user_id == author_id {
            return false;
        }
        match self.follows.entry((user_id, author_id)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Follow {
                    user_id,
                    author_id,
                    created_at: Utc::now(),
                });
                true
            }
        }
    }

    /// Returns `false` if there was no such edge.
    pub fn unfollow(&self, user_id: &Uuid, author_id: &Uuid) -> bool {
        self.follows.remove(&(*user_id, *author_id)).is_some()
    }

    pub fn is_following(&self, user_id: &Uuid, author_id: &Uuid) -> bool {
        self.follows.contains_key(&(*user_id, *author_id))
    }

    pub fn follow_count(&self) -> usize {
        self.follows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(store: &Store, name: &str) -> User {
        store
            .create_user(&format!("{name}@example.com"), name, "hash".into())
            .unwrap()
    }

    fn draft(text: &str, group_id: Option<i64>) -> PostDraft {
        PostDraft {
            text: text.into(),
            group_id,
            image: None,
        }
    }

    #[test]
    fn duplicate_username_releases_email() {
        let store = Store::new();
        user(&store, "leo");

        let err = store
            .create_user("other@example.com", "leo", "hash".into())
            .unwrap_err();
        assert_eq!(err, StoreError::UsernameTaken("leo".into()));
        assert!(store.user_by_email("other@example.com").is_none());

        // the email is still free for a later signup
        store
            .create_user("other@example.com", "tolstoy", "hash".into())
            .unwrap();
    }

    #[test]
    fn group_slug_is_unique() {
        let store = Store::new();
        store.create_group("Cats", "cats", "").unwrap();
        assert_eq!(
            store.create_group("More cats", "cats", "").unwrap_err(),
            StoreError::SlugTaken("cats".into())
        );
    }

    #[test]
    fn posts_are_newest_first() {
        let store = Store::new();
        let author = user(&store, "leo");
        let first = store.create_post(author.id, draft("first", None));
        let second = store.create_post(author.id, draft("second", None));

        let ids: Vec<i64> = store.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn update_keeps_pub_date_and_author() {
        let store = Store::new();
        let author = user(&store, "leo");
        let post = store.create_post(author.id, draft("old", None));

        let updated = store.update_post(post.id, draft("new", None)).unwrap();
        assert_eq!(updated.text, "new");
        assert_eq!(updated.pub_date, post.pub_date);
        assert_eq!(updated.author_id, author.id);
    }

    #[test]
    fn deleting_group_detaches_posts() {
        let store = Store::new();
        let author = user(&store, "leo");
        let group = store.create_group("Cats", "cats", "").unwrap();
        let post = store.create_post(author.id, draft("meow", Some(group.id)));

        assert!(store.delete_group(group.id));
        assert_eq!(store.post(post.id).unwrap().group_id, None);
        assert!(store.group_by_slug("cats").is_none());
    }

    #[test]
    fn deleting_post_removes_its_comments() {
        let store = Store::new();
        let author = user(&store, "leo");
        let post = store.create_post(author.id, draft("text", None));
        let other = store.create_post(author.id, draft("text", None));
        store.create_comment(post.id, author.id, "a".into());
        store.create_comment(other.id, author.id, "b".into());

        assert!(store.delete_post(post.id));
        assert_eq!(store.comment_count(), 1);
        assert!(!store.delete_post(post.id));
    }

    #[test]
    fn deleting_user_cascades() {
        let store = Store::new();
        let leo = user(&store, "leo");
        let anna = user(&store, "anna");
        let post = store.create_post(leo.id, draft("text", None));
        let kept = store.create_post(anna.id, draft("text", None));
        store.create_comment(post.id, anna.id, "on leo".into());
        store.create_comment(kept.id, leo.id, "by leo".into());
        store.create_comment(kept.id, anna.id, "by anna".into());
        store.follow(leo.id, anna.id);
        store.follow(anna.id, leo.id);

        assert!(store.delete_user(&leo.id));
        assert!(store.post(post.id).is_none());
        assert!(store.post(kept.id).is_some());
        assert_eq!(store.comment_count(), 1);
        assert_eq!(store.follow_count(), 0);
        assert!(store.user_by_username("leo").is_none());
    }

    #[test]
    fn follow_edges_are_unique_and_never_self() {
        let store = Store::new();
        let leo = user(&store, "leo");
        let anna = user(&store, "anna");

        assert!(store.follow(leo.id, anna.id));
        assert!(!store.follow(leo.id, anna.id));
        assert!(!store.follow(leo.id, leo.id));
        assert_eq!(store.follow_count(), 1);

        assert!(store.unfollow(&leo.id, &anna.id));
        assert!(!store.unfollow(&leo.id, &anna.id));
        assert_eq!(store.follow_count(), 0);
    }

    #[test]
    fn followed_posts_only_include_followed_authors() {
        let store = Store::new();
        let reader = user(&store, "reader");
        let leo = user(&store, "leo");
        let anna = user(&store, "anna");
        let by_leo = store.create_post(leo.id, draft("leo", None));
        store.create_post(anna.id, draft("anna", None));

        assert!(store.posts_followed_by(&reader.id).is_empty());
        store.follow(reader.id, leo.id);
        let feed = store.posts_followed_by(&reader.id);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, by_leo.id);
    }
}
