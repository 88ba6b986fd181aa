use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{AppState, error::ApiError};

pub mod admin;
pub mod conference;

/// Run a blocking service call off the async runtime
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> confbook_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("Worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// `/` has no locale yet; send the visitor to the default one
async fn index_no_locale(axum::extract::State(state): axum::extract::State<AppState>) -> Response {
    let location = format!("/{}/", state.config.locale.default_locale);
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_no_locale))
        .merge(conference::router())
        .merge(admin::router())
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_http::get;
    use super::*;
    use crate::test_support::app;

    #[tokio::test]
    async fn test_root_redirects_to_default_locale() {
        let app = app();
        let response = get(router(app.state), "/").await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/en/");
    }
}
