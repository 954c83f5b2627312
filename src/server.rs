use crate::blog::{BlogClient, BlogError, BlogPost, PostQuery};
use crate::contact::ContactForm;
use crate::error::ApiError;
use crate::github::{GithubClient, GithubStats, GithubUser, Repository};
use crate::protocol::ChatRequest;
use crate::relay::Relay;
use axum::Json;
use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE, TRANSFER_ENCODING};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use futures::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Frames buffered between the relay task and the response body.
const FRAME_BUFFER: usize = 64;

pub struct ServerConfig {
    pub listen: String,
    pub static_dir: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppState {
    relay: Arc<Relay>,
    github: Arc<GithubClient>,
    blog: Arc<BlogClient>,
    chat_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(
        relay: Relay,
        github: GithubClient,
        blog: BlogClient,
        max_concurrent_chats: usize,
    ) -> Self {
        Self {
            relay: Arc::new(relay),
            github: Arc::new(github),
            blog: Arc::new(blog),
            chat_slots: Arc::new(Semaphore::new(max_concurrent_chats)),
        }
    }
}

type ServerResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

pub async fn run(config: ServerConfig, state: AppState) -> ServerResult<()> {
    let app = router(state, config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!("folio server listening on http://{}", config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState, static_dir: Option<PathBuf>) -> axum::Router {
    let mut app = axum::Router::new()
        .route("/api/chat", post(chat))
        .route("/api/contact", post(contact))
        .route("/api/github/stats", get(github_stats))
        .route("/api/github/user", get(github_user))
        .route("/api/github/repositories", get(github_repositories))
        .route("/api/blog/posts", get(blog_posts))
        .with_state(state);

    if let Some(dir) = static_dir {
        info!(dir = %dir.display(), "serving static frontend");
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    app.layer(TraceLayer::new_for_http())
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let message = match payload {
        Ok(Json(ChatRequest {
            message: Some(message),
        })) if !message.trim().is_empty() => message,
        Ok(_) => {
            return Err(ApiError::bad_request(
                "Message is required",
                "message must be a non-empty string",
            ));
        }
        Err(rejection) => {
            return Err(ApiError::bad_request(
                "Message is required",
                rejection.body_text(),
            ));
        }
    };

    let permit = Arc::clone(&state.chat_slots)
        .try_acquire_owned()
        .map_err(|_| {
            warn!("chat capacity exhausted");
            ApiError::unavailable(
                "Chat is busy",
                "too many conversations in progress, try again shortly",
            )
        })?;

    let (frames, rx) = mpsc::channel(FRAME_BUFFER);
    let relay = Arc::clone(&state.relay);
    tokio::spawn(async move {
        relay.run(message, frames).await;
        drop(permit);
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    Ok(response)
}

async fn contact(payload: Result<Json<ContactForm>, JsonRejection>) -> Response {
    let form = match payload {
        Ok(Json(form)) => form,
        Err(rejection) => {
            return contact_rejected(rejection.body_text());
        }
    };

    if let Err(issues) = form.validate() {
        return contact_rejected(issues.join(", "));
    }

    info!(name = %form.name, email = %form.email, subject = %form.subject, "contact form submitted");
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Thank you for your message! I'll get back to you soon.",
            "data": form,
        })),
    )
        .into_response()
}

fn contact_rejected(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "error": "Validation failed",
            "message": message,
        })),
    )
        .into_response()
}

async fn github_stats(State(state): State<AppState>) -> Result<Json<GithubStats>, ApiError> {
    state.github.stats().await.map(Json).map_err(|err| {
        error!(%err, "Error fetching GitHub stats");
        ApiError::internal("Failed to fetch GitHub statistics", err)
    })
}

async fn github_user(State(state): State<AppState>) -> Result<Json<GithubUser>, ApiError> {
    state.github.user().await.map(Json).map_err(|err| {
        error!(%err, "Error fetching GitHub user");
        ApiError::internal("Failed to fetch GitHub user profile", err)
    })
}

async fn github_repositories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Repository>>, ApiError> {
    state.github.repositories().await.map(Json).map_err(|err| {
        error!(%err, "Error fetching GitHub repositories");
        ApiError::internal("Failed to fetch GitHub repositories", err)
    })
}

async fn blog_posts(
    State(state): State<AppState>,
    query: Result<Query<PostQuery>, QueryRejection>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    let Query(query) = query
        .map_err(|rejection| ApiError::bad_request("Invalid query", rejection.body_text()))?;

    state.blog.posts(&query).await.map(Json).map_err(|err| {
        error!(%err, "Error fetching Medium blog posts");
        match err {
            BlogError::Parse(_) => ApiError::internal("Failed to parse Medium RSS feed", err),
            _ => ApiError::internal("Failed to fetch Medium blog posts", err),
        }
    })
}
