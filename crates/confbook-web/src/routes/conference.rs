use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, HeaderName, StatusCode, Uri, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use confbook_core::{
    ConfbookError,
    comment::{Comment, NewComment},
    conference::Conference,
    notify::{Notification, SUBMISSION_PROBLEMS},
    photo::PhotoUpload,
};
use serde::{Deserialize, Serialize};

use super::blocking;
use crate::{AppState, context::request_context, error::ApiError};

/// Response header carrying the flash notice of a submission
pub const NOTICE_HEADER: &str = "x-confbook-notice";
/// Response header telling whether a page came from the page cache
pub const CACHE_STATUS_HEADER: &str = "x-confbook-cache";

#[derive(Debug, Serialize)]
pub struct ConferenceList {
    pub locale: String,
    pub conferences: Vec<Conference>,
}

#[derive(Debug, Serialize)]
pub struct HeaderEntry {
    pub name: String,
    pub slug: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ConferencePage {
    pub conference: Conference,
    pub comments: Vec<Comment>,
    pub total: usize,
    pub previous: i64,
    pub next: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionProblems {
    pub success: bool,
    pub notice: Notification,
    pub message: String,
}

fn ensure_locale(state: &AppState, locale: &str) -> Result<(), ApiError> {
    if state.config.locale.is_supported(locale) {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!("Unsupported locale: {}", locale)))
    }
}

/// Serve `path` from the page cache, rendering it with `render` on a miss
async fn cached<F>(state: &AppState, path: &str, render: F) -> Result<Response, ApiError>
where
    F: FnOnce() -> confbook_core::Result<String> + Send + 'static,
{
    let (body, status) = match state.cache.get(path) {
        Some(body) => (body, "hit"),
        None => {
            let body = blocking(render).await?;
            state.cache.insert(path, body.clone());
            (body, "miss")
        }
    };

    let headers = [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (header::CACHE_CONTROL, state.cache.cache_control()),
        (HeaderName::from_static(CACHE_STATUS_HEADER), status.to_string()),
    ];
    Ok((headers, body).into_response())
}

pub async fn homepage(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    uri: Uri,
) -> Result<Response, ApiError> {
    ensure_locale(&state, &locale)?;
    let conferences = state.conferences.clone();
    cached(&state, uri.path(), move || {
        let list = ConferenceList {
            locale,
            conferences: conferences.all()?,
        };
        Ok(serde_json::to_string(&list)?)
    })
    .await
}

pub async fn conference_header(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    uri: Uri,
) -> Result<Response, ApiError> {
    ensure_locale(&state, &locale)?;
    let conferences = state.conferences.clone();
    cached(&state, uri.path(), move || {
        let entries: Vec<HeaderEntry> = conferences
            .all()?
            .into_iter()
            .map(|c| HeaderEntry {
                name: c.to_string(),
                url: format!("/{}/conference/{}", locale, c.slug),
                slug: c.slug,
            })
            .collect();
        Ok(serde_json::to_string(&entries)?)
    })
    .await
}

pub async fn show(
    State(state): State<AppState>,
    Path((locale, slug)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ConferencePage>, ApiError> {
    ensure_locale(&state, &locale)?;
    let offset = query.offset.unwrap_or(0);

    let page = blocking(move || {
        let conference = state.conferences.find_by_slug(&slug)?;
        let page = state.comments.page(&conference, offset)?;
        Ok(ConferencePage {
            previous: page.previous(),
            next: page.next(),
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            total: page.total,
            comments: page.comments,
            conference,
        })
    })
    .await?;

    Ok(Json(page))
}

/// Collect the comment form; an empty photo field means no photo
async fn read_form(mut multipart: Multipart) -> Result<(NewComment, Option<PhotoUpload>), ApiError> {
    let mut submission = NewComment::default();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "author" => submission.author = field.text().await?,
            "email" => submission.email = field.text().await?,
            "text" => submission.text = field.text().await?,
            "photo" => {
                let original_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    photo = Some(PhotoUpload {
                        original_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => tracing::debug!("Ignoring form field {:?}", other),
        }
    }

    Ok((submission, photo))
}

pub async fn submit(
    State(state): State<AppState>,
    Path((locale, slug)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    ensure_locale(&state, &locale)?;
    let (submission, photo) = read_form(multipart).await?;

    let permalink = format!(
        "{}{}",
        state.config.server.base_url.trim_end_matches('/'),
        uri.path()
    );
    let context = request_context(&headers, permalink);

    let location = format!("/{}/conference/{}", locale, slug);
    let service = state.comments.clone();
    let conferences = state.conferences.clone();
    let result = blocking(move || {
        let conference = conferences.find_by_slug(&slug)?;
        service.submit(&conference, submission, photo, context)
    })
    .await;

    match result {
        Ok(submission) => {
            let mut response = Redirect::to(&location).into_response();
            if let Ok(value) = submission.notice.subject.parse() {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(NOTICE_HEADER), value);
            }
            Ok(response)
        }
        Err(ApiError::Confbook(e)) if matches!(e.root(), ConfbookError::Validation(_)) => {
            let body = SubmissionProblems {
                success: false,
                notice: Notification::browser(SUBMISSION_PROBLEMS),
                message: e.root().to_string(),
            };
            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
        Err(e) => Err(e),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{locale}/", get(homepage))
        .route("/{locale}/conference_header", get(conference_header))
        .route("/{locale}/conference/{slug}", get(show).post(submit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::router as app_router;
    use crate::routes::test_http::{body_json, get, send};
    use crate::test_support::{TestApp, app};
    use axum::body::Body;
    use axum::http::Request;
    use confbook_core::comment::{CommentBuilder, CommentState};
    use confbook_core::messaging::Message;
    use confbook_core::notify::SUBMISSION_THANKS;
    use confbook_core::store::{CommentStore, ConferenceStore};
    use confbook_core::workflow::{CommentTransition, CommentWorkflow, StateMachine};
    use pretty_assertions::assert_eq;

    const BOUNDARY: &str = "confbook-test-boundary";

    fn form_request(uri: &str, fields: &[(&str, &str)], photo: Option<(&str, &str, &[u8])>) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((filename, content_type, bytes)) = photo {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    BOUNDARY, filename, content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .header(header::USER_AGENT, "test-agent")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(body))
            .unwrap()
    }

    fn valid_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("author", "Lucas"),
            ("email", "lucas@example.com"),
            ("text", "Great talks and even better people."),
        ]
    }

    fn publish_extra(app: &TestApp, slug: &str, count: usize) {
        let conference = app.store.find_by_slug(slug).unwrap();
        for i in 0..count {
            let mut comment = CommentBuilder::new(conference.id)
                .author(format!("Visitor {}", i))
                .email("visitor@example.com")
                .text("Nice")
                .build()
                .unwrap();
            CommentWorkflow::apply_transition(&mut comment, CommentTransition::AcceptAsHam).unwrap();
            CommentWorkflow::apply_transition(&mut comment, CommentTransition::Publish).unwrap();
            app.store.save(&comment).unwrap();
        }
    }

    #[tokio::test]
    async fn test_homepage_is_cached() {
        let app = app();

        let first = get(app_router(app.state.clone()), "/en/").await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            first.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, s-maxage=3600"
        );
        assert_eq!(first.headers().get(CACHE_STATUS_HEADER).unwrap(), "miss");
        let json = body_json(first).await;
        assert_eq!(json["conferences"][0]["slug"], "amsterdam-2022");
        assert_eq!(json["conferences"][1]["slug"], "paris-2023");

        let second = get(app_router(app.state.clone()), "/en/").await;
        assert_eq!(second.headers().get(CACHE_STATUS_HEADER).unwrap(), "hit");
    }

    #[tokio::test]
    async fn test_unsupported_locale() {
        let app = app();
        let response = get(app_router(app.state), "/de/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_conference_header() {
        let app = app();
        let response = get(app_router(app.state), "/fr/conference_header").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json[0]["name"], "Amsterdam 2022");
        assert_eq!(json[1]["url"], "/fr/conference/paris-2023");
    }

    #[tokio::test]
    async fn test_show_paginates_published_comments() {
        let app = app();
        publish_extra(&app, "amsterdam-2022", 2);

        let response = get(app_router(app.state.clone()), "/en/conference/amsterdam-2022").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["comments"].as_array().unwrap().len(), 2);
        assert_eq!(json["previous"], -2);
        assert_eq!(json["next"], 2);
        assert_eq!(json["has_next"], true);

        let response = get(
            app_router(app.state.clone()),
            "/en/conference/amsterdam-2022?offset=2",
        )
        .await;
        let json = body_json(response).await;
        assert_eq!(json["comments"].as_array().unwrap().len(), 1);
        assert_eq!(json["previous"], 0);
        assert_eq!(json["next"], 3);
        assert_eq!(json["has_next"], false);
    }

    #[tokio::test]
    async fn test_show_unknown_conference() {
        let app = app();
        let response = get(app_router(app.state), "/en/conference/berlin-1999").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_redirects_and_queues() {
        let app = app();
        let request = form_request("/en/conference/paris-2023", &valid_fields(), None);
        let response = send(app_router(app.state.clone()), request).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/en/conference/paris-2023"
        );
        assert_eq!(
            response.headers().get(NOTICE_HEADER).unwrap(),
            SUBMISSION_THANKS
        );

        let paris = app.store.find_by_slug("paris-2023").unwrap();
        let comments = app.store.list_for_conference(&paris.id).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].state(), CommentState::Submitted);

        let messages = app.dispatcher.messages();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            Message::ClassifyAndNotify { comment_id, context, review_url } => {
                assert_eq!(*comment_id, comments[0].id);
                assert_eq!(context.user_ip.as_deref(), Some("203.0.113.7"));
                assert_eq!(context.user_agent.as_deref(), Some("test-agent"));
                assert_eq!(
                    context.permalink,
                    "http://127.0.0.1:8000/en/conference/paris-2023"
                );
                assert!(review_url.ends_with(&format!("/admin/comment/review/{}", comment_id)));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_with_photo() {
        let app = app();
        let request = form_request(
            "/en/conference/paris-2023",
            &valid_fields(),
            Some(("me.png", "image/png", &b"\x89PNG"[..])),
        );
        let response = send(app_router(app.state.clone()), request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let filenames = app.photos.filenames();
        assert_eq!(filenames.len(), 1);
        let paris = app.store.find_by_slug("paris-2023").unwrap();
        let comment = &app.store.list_for_conference(&paris.id).unwrap()[0];
        assert_eq!(comment.photo_filename.as_deref(), Some(filenames[0].as_str()));
    }

    #[tokio::test]
    async fn test_invalid_submission_is_rejected() {
        let app = app();
        let fields = [("author", "Lucas"), ("email", "not-an-email"), ("text", "Hi")];
        let request = form_request("/en/conference/paris-2023", &fields, None);
        let response = send(app_router(app.state.clone()), request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["notice"]["subject"], SUBMISSION_PROBLEMS);

        assert!(app.dispatcher.messages().is_empty());
        assert_eq!(app.store.list().unwrap().len(), 1);
        assert_eq!(app.notifier.sent()[0].subject, SUBMISSION_PROBLEMS);
    }

    #[tokio::test]
    async fn test_submit_to_unknown_conference() {
        let app = app();
        let request = form_request("/en/conference/berlin-1999", &valid_fields(), None);
        let response = send(app_router(app.state.clone()), request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(app.dispatcher.messages().is_empty());
    }
}
