#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, Response, header},
};
use blogfeed::{
    AppState, Config,
    auth::create_token,
    models::{Group, Post, User},
    router,
    store::PostDraft,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";

pub const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

const BOUNDARY: &str = "----blogfeed-test-boundary";

pub struct TestApp {
    pub state: AppState,
    router: Router,
    pub media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let mut config = Config::new(SECRET, media.path());
        config.bcrypt_cost = 4;
        let state = AppState::new(config);
        let router = router(state.clone());
        Self {
            state,
            router,
            media,
        }
    }

    pub fn user(&self, username: &str) -> User {
        self.state
            .store
            .create_user(&format!("{username}@example.com"), username, "x".into())
            .unwrap()
    }

    pub fn group(&self, slug: &str) -> Group {
        self.state
            .store
            .create_group(&format!("Group {slug}"), slug, "A test group")
            .unwrap()
    }

    pub fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.state.store.create_post(
            author.id,
            PostDraft {
                text: text.into(),
                group_id: group.map(|g| g.id),
                image: None,
            },
        )
    }

    pub fn token(&self, user: &User) -> String {
        create_token(&user.id, &user.email, SECRET, 1).unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str, user: Option<&User>) -> Response<Body> {
        let mut req = Request::get(uri);
        if let Some(user) = user {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, user: &User, body: &str) -> Response<Body> {
        let req = Request::post(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        user: &User,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> Response<Body> {
        let req = Request::post(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, image)))
            .unwrap();
        self.send(req).await
    }
}

pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/gif\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
