//! Feed composition: picks the posts for each kind of feed, pages them, and
//! joins every post on the page with its author, group and comment count.

use crate::{
    dto::{AuthorRef, CommentView, GroupRef, PostView},
    media::media_url,
    models::{Comment, Group, Post, User},
    pagination::{Page, PaginationParams, paginate},
    store::Store,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Joins one post. Authors are required, so a missing author means the post
/// is mid-cascade and is skipped.
pub fn post_view(store: &Store, post: Post) -> Option<PostView> {
    let author = store.user(&post.author_id)?;
    let group = post.group_id.and_then(|id| store.group(id));
    Some(build_view(store, post, &author, group.as_ref()))
}

fn build_view(store: &Store, post: Post, author: &User, group: Option<&Group>) -> PostView {
    PostView {
        id: post.id,
        comment_count: store.comment_count_for_post(post.id),
        image_url: post.image.as_deref().map(media_url),
        image: post.image,
        text: post.text,
        pub_date: post.pub_date,
        author: AuthorRef::from(author),
        group: group.map(GroupRef::from),
    }
}

/// Drops posts whose author is gone, then pages and joins what is on the page.
fn compose(store: &Store, posts: Vec<Post>, params: &PaginationParams) -> Page<PostView> {
    let mut authors: HashMap<Uuid, User> = HashMap::new();
    let posts: Vec<(Post, User)> = posts
        .into_iter()
        .filter_map(|post| {
            if !authors.contains_key(&post.author_id) {
                let author = store.user(&post.author_id)?;
                authors.insert(author.id, author);
            }
            let author = authors[&post.author_id].clone();
            Some((post, author))
        })
        .collect();

    let mut groups: HashMap<i64, Option<Group>> = HashMap::new();
    paginate(posts, params).map(|(post, author)| {
        let group = post
            .group_id
            .and_then(|id| groups.entry(id).or_insert_with(|| store.group(id)).clone());
        build_view(store, post, &author, group.as_ref())
    })
}

pub fn global_feed(store: &Store, params: &PaginationParams) -> Page<PostView> {
    compose(store, store.posts(), params)
}

pub fn group_feed(store: &Store, group: &Group, params: &PaginationParams) -> Page<PostView> {
    compose(store, store.posts_in_group(group.id), params)
}

pub struct ProfileFeed {
    pub posts_count: usize,
    pub following: bool,
    pub page: Page<PostView>,
}

/// `viewer` is `None` for anonymous visitors, who never follow anyone.
pub fn profile_feed(
    store: &Store,
    author: &User,
    viewer: Option<&User>,
    params: &PaginationParams,
) -> ProfileFeed {
    let posts = store.posts_by_author(&author.id);
    let following = viewer.is_some_and(|v| store.is_following(&v.id, &author.id));
    ProfileFeed {
        posts_count: posts.len(),
        following,
        page: compose(store, posts, params),
    }
}

pub fn follow_feed(store: &Store, viewer: &User, params: &PaginationParams) -> Page<PostView> {
    compose(store, store.posts_followed_by(&viewer.id), params)
}

pub fn comment_views(store: &Store, comments: Vec<Comment>) -> Vec<CommentView> {
    comments
        .into_iter()
        .filter_map(|comment| {
            let author = store.user(&comment.author_id)?;
            Some(CommentView {
                id: comment.id,
                text: comment.text,
                pub_date: comment.pub_date,
                author: AuthorRef::from(&author),
            })
        })
        .collect()
}
