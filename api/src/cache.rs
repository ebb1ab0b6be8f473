//! Whole-response cache for the front page.
//!
//! Entries expire on a fixed TTL. Nothing invalidates them on writes, so a
//! reader may see a front page up to one TTL old.

use crate::states::AppState;
use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, error};

pub const INDEX_KEY_PREFIX: &str = "index_page";

/// Rendered pages larger than this are served but not cached.
const MAX_CACHED_BODY: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct CachedPage {
    content_type: Option<HeaderValue>,
    body: Bytes,
}

impl IntoResponse for CachedPage {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}

#[derive(Clone)]
pub struct PageCache {
    prefix: &'static str,
    pages: Cache<String, CachedPage>,
}

impl PageCache {
    pub fn new(prefix: &'static str, ttl: Duration) -> Self {
        let pages = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(ttl)
            .build();
        Self { prefix, pages }
    }

    /// One entry per path and query, so every page number is cached on its own.
    pub fn key_for(&self, uri: &Uri) -> String {
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        format!("{}:{}", self.prefix, target)
    }

    pub async fn get(&self, key: &str) -> Option<CachedPage> {
        self.pages.get(key).await
    }

    pub async fn insert(&self, key: String, page: CachedPage) {
        self.pages.insert(key, page).await;
    }

    pub fn clear(&self) {
        self.pages.invalidate_all();
    }
}

/// Middleware for the cached routes. Only successful GETs are stored.
pub async fn cache_page(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let key = state.page_cache.key_for(req.uri());
    if let Some(page) = state.page_cache.get(&key).await {
        debug!("Page cache hit: {}", key);
        return page.into_response();
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to buffer response for {}: {}", key, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if bytes.len() > MAX_CACHED_BODY {
        debug!("Page too large to cache: {} ({} bytes)", key, bytes.len());
    } else {
        state
            .page_cache
            .insert(
                key,
                CachedPage {
                    content_type: parts.headers.get(header::CONTENT_TYPE).cloned(),
                    body: bytes.clone(),
                },
            )
            .await;
    }

    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &'static str) -> CachedPage {
        CachedPage {
            content_type: None,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn keys_include_the_query() {
        let cache = PageCache::new(INDEX_KEY_PREFIX, Duration::from_secs(20));
        let first: Uri = "/".parse().unwrap();
        let second: Uri = "/?page=2".parse().unwrap();
        assert_eq!(cache.key_for(&first), "index_page:/");
        assert_eq!(cache.key_for(&second), "index_page:/?page=2");
    }

    #[tokio::test]
    async fn clear_drops_every_entry() {
        let cache = PageCache::new(INDEX_KEY_PREFIX, Duration::from_secs(20));
        cache.insert("a".into(), page("one")).await;
        cache.insert("b".into(), page("two")).await;
        assert_eq!(cache.get("a").await.unwrap().body, "one");

        cache.clear();
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_none());
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = PageCache::new(INDEX_KEY_PREFIX, Duration::from_millis(50));
        cache.insert("a".into(), page("one")).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get("a").await.is_none());
    }
}
