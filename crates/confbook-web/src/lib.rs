//! confbook-web - HTTP entry points for confbook
//!
//! An axum router over the comment service: conference listings, the
//! conference page with its published comments, comment submission and the
//! admin review and cache purge endpoints.

pub mod cache;
pub mod context;
pub mod error;
pub mod routes;

use cache::PageCache;
use confbook_core::config::Config;
use confbook_core::service::CommentService;
use confbook_core::store::ConferenceStore;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use error::ApiError;
pub use routes::router;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<CommentService>,
    pub conferences: Arc<dyn ConferenceStore>,
    pub cache: Arc<PageCache>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        comments: Arc<CommentService>,
        conferences: Arc<dyn ConferenceStore>,
    ) -> Self {
        Self {
            cache: Arc::new(PageCache::new(config.cache.shared_max_age)),
            comments,
            conferences,
            config: Arc::new(config),
        }
    }
}

/// Bind `addr` and serve until the task is cancelled
pub async fn serve(state: AppState, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
