// ============================================================================
// BLOG FEED SERVICE
// ============================================================================

// - Posts with optional group and image
// - Global, group, profile and follow feeds, 10 posts per page
// - Comments and follow edges
// - JWT authentication, login redirects for protected pages
// - 20 second whole-page cache on the front page
// - Structured logging

use blogfeed::{AppState, Config, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blogfeed=info,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::load()?;
    let addr = config.bind_addr.clone();

    tokio::fs::create_dir_all(&config.media_root).await?;

    let app = router(AppState::new(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET      /                              - Global feed (cached)");
    info!("  GET      /group/:slug/                  - Group feed");
    info!("  GET      /profile/:username/            - Profile feed");
    info!("  GET      /follow/                       - Follow feed (auth)");
    info!("  GET      /posts/:id/                    - Post detail");
    info!("  GET/POST /create/                       - Create post (auth)");
    info!("  GET/POST /posts/:id/edit/               - Edit post (auth, author only)");
    info!("  POST     /posts/:id/comment/            - Add comment (auth)");
    info!("  GET/POST /profile/:username/follow/     - Follow author (auth)");
    info!("  GET/POST /profile/:username/unfollow/   - Unfollow author (auth)");
    info!("  POST     /auth/signup/                  - Create account");
    info!("  POST     /auth/login/                   - Login");

    axum::serve(listener, app).await?;
    Ok(())
}
