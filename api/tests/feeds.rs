mod common;

use axum::http::StatusCode;
use common::{TestApp, body_json};

#[tokio::test]
async fn group_feed_pages_seventeen_posts_as_ten_and_seven() {
    let app = TestApp::new();
    let author = app.user("leo");
    let group = app.group("cats");
    for i in 1..=17 {
        app.post(&author, &format!("post {i}"), Some(&group));
    }

    let first = body_json(app.get("/group/cats/", None).await).await;
    assert_eq!(first["page_obj"]["items"].as_array().unwrap().len(), 10);
    assert_eq!(first["page_obj"]["num_pages"], 2);
    assert_eq!(first["group"]["slug"], "cats");

    let second = body_json(app.get("/group/cats/?page=2", None).await).await;
    assert_eq!(second["page_obj"]["items"].as_array().unwrap().len(), 7);
    assert_eq!(second["page_obj"]["has_next"], false);
}

#[tokio::test]
async fn out_of_range_page_shows_last_page() {
    let app = TestApp::new();
    let author = app.user("leo");
    for i in 1..=12 {
        app.post(&author, &format!("post {i}"), None);
    }

    let page = body_json(app.get("/profile/leo/?page=50", None).await).await;
    assert_eq!(page["page_obj"]["number"], 2);
    assert_eq!(page["page_obj"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn feeds_are_newest_first() {
    let app = TestApp::new();
    let author = app.user("leo");
    app.post(&author, "older", None);
    app.post(&author, "newer", None);

    let page = body_json(app.get("/", None).await).await;
    let items = page["page_obj"]["items"].as_array().unwrap();
    assert_eq!(items[0]["text"], "newer");
    assert_eq!(items[1]["text"], "older");
    assert_eq!(page["is_index"], true);
}

#[tokio::test]
async fn group_feed_only_shows_its_own_posts() {
    let app = TestApp::new();
    let author = app.user("leo");
    let cats = app.group("cats");
    let dogs = app.group("dogs");
    app.post(&author, "meow", Some(&cats));
    app.post(&author, "woof", Some(&dogs));
    app.post(&author, "no group", None);

    let page = body_json(app.get("/group/cats/", None).await).await;
    let items = page["page_obj"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["text"], "meow");
    assert_eq!(items[0]["group"]["slug"], "cats");
    assert_eq!(items[0]["author"]["username"], "leo");
}

#[tokio::test]
async fn unknown_group_and_profile_are_not_found() {
    let app = TestApp::new();

    let group = app.get("/group/nope/", None).await;
    assert_eq!(group.status(), StatusCode::NOT_FOUND);

    let profile = app.get("/profile/nobody/", None).await;
    assert_eq!(profile.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_reports_whether_viewer_follows() {
    let app = TestApp::new();
    let author = app.user("leo");
    let reader = app.user("anna");
    app.post(&author, "hello", None);

    let anonymous = body_json(app.get("/profile/leo/", None).await).await;
    assert_eq!(anonymous["following"], false);
    assert_eq!(anonymous["posts_count"], 1);

    app.state.store.follow(reader.id, author.id);
    let following = body_json(app.get("/profile/leo/", Some(&reader)).await).await;
    assert_eq!(following["following"], true);

    let own = body_json(app.get("/profile/leo/", Some(&author)).await).await;
    assert_eq!(own["following"], false);
}

#[tokio::test]
async fn follow_feed_shows_followed_authors_only() {
    let app = TestApp::new();
    let author = app.user("leo");
    let stranger = app.user("stranger");
    let reader = app.user("anna");
    app.post(&author, "from leo", None);
    app.post(&stranger, "from stranger", None);

    let empty = body_json(app.get("/follow/", Some(&reader)).await).await;
    assert!(empty["page_obj"]["items"].as_array().unwrap().is_empty());

    app.state.store.follow(reader.id, author.id);
    let page = body_json(app.get("/follow/", Some(&reader)).await).await;
    let items = page["page_obj"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["text"], "from leo");
    assert_eq!(page["is_follow_index"], true);
}

#[tokio::test]
async fn deleted_group_leaves_posts_in_global_feed() {
    let app = TestApp::new();
    let author = app.user("leo");
    let group = app.group("cats");
    app.post(&author, "meow", Some(&group));

    app.state.store.delete_group(group.id);

    let page = body_json(app.get("/", None).await).await;
    let items = page["page_obj"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0]["group"].is_null());
}
