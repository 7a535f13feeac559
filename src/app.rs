use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::client::NotesClient;
use crate::config::Config;
use crate::dashboard::{ListingSession, ViewUpdate};
use crate::listing::ListingPage;
use crate::login::{self, SESSION_COOKIE};
use crate::session::{Access, LandingState, Role, Route, Session, SessionStore, guard};
use crate::upload::{
    FileAttachment, LinkStatus, UPLOADED_MESSAGE, UploadDraft, UploadError, UploadMethod,
    UploadPhase,
};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load notes. Please try again.";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete note.";
pub const DELETED_MESSAGE: &str = "🗑️ Note deleted successfully!";

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub struct AppState {
    pub config: Arc<Config>,
    pub client: NotesClient,
    pub sessions: SessionStore,
    listings: Mutex<HashMap<String, ListingSession>>,
}

impl AppState {
    pub fn new(config: Config) -> crate::Result<Arc<Self>> {
        let config = Arc::new(config);
        let client = NotesClient::new(config.clone())?;

        Ok(Arc::new(AppState {
            sessions: SessionStore::new(config.session_ttl),
            client,
            config,
            listings: Mutex::new(HashMap::new()),
        }))
    }

    /// Run `f` against the listing of `session_id`, if one is open
    pub fn with_listing<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut ListingSession) -> T,
    ) -> Option<T> {
        let mut listings = self.listings.lock().unwrap_or_else(|e| e.into_inner());
        listings.get_mut(session_id).map(f)
    }

    /// Start a new listing for `session_id`, dropping any previous one
    pub fn open_listing(&self, session_id: &str, mut listing: ListingSession) -> ListingPage {
        let page = listing.page();
        let mut listings = self.listings.lock().unwrap_or_else(|e| e.into_inner());
        listings.insert(session_id.to_string(), listing);
        page
    }

    pub fn forget_listing(&self, session_id: &str) {
        let mut listings = self.listings.lock().unwrap_or_else(|e| e.into_inner());
        listings.remove(session_id);
    }

    /// Drop expired sessions and any listing left without a live session
    pub fn purge_expired(&self) -> usize {
        let purged = self.sessions.purge_expired();
        let mut listings = self.listings.lock().unwrap_or_else(|e| e.into_inner());
        listings.retain(|session_id, _| self.sessions.validate(session_id).is_some());
        purged
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not signed in")]
    Unauthorized,

    #[error("Only educators can do that")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Backend(String),

    #[error("🚨 The upload is larger than {0} bytes.")]
    TooLarge(usize),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Failed => AppError::Backend(e.to_string()),
            _ => AppError::BadRequest(e.to_string()),
        }
    }
}

/// Listing page plus a one-off status message for the toast
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MutationResponse {
    message: &'static str,
    /// Final line of the upload form, when the mutation came from it
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    page: ListingPage,
}

#[derive(Deserialize)]
struct LinkQuery {
    #[serde(default)]
    url: String,
}

/// Live check of the link typed into the upload form
#[derive(Serialize)]
struct LinkCheck {
    status: LinkStatus,
    indicator: &'static str,
    preview: Option<String>,
}

#[derive(Deserialize)]
struct PreviewRequest {
    key: String,
}

/// Build the router over an existing state
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(serve_landing))
        .route(
            "/student-login",
            get(login::serve_student_login).post(login::handle_student_login),
        )
        .route(
            "/educator-login",
            get(login::serve_educator_login).post(login::handle_educator_login),
        )
        .route("/logout", get(login::handle_logout))
        .route("/switch-account", get(login::handle_switch_account))
        .route("/dashboard", get(serve_student_dashboard))
        .route("/educator-dashboard", get(serve_educator_dashboard))
        .route("/api/listing", get(get_listing))
        .route("/api/listing/view", post(update_view))
        .route("/api/listing/refresh", post(refresh_listing))
        .route(
            "/api/listing/preview",
            post(open_preview).delete(close_preview),
        )
        .route("/api/notes/:id", delete(delete_note))
        .route(
            "/api/upload",
            post(upload_note).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/upload/link", get(check_upload_link))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(serve_not_found)
        .layer(
            TraceLayer::new_for_http()
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config)?;

    // Sweep expired sessions and their listings in the background
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sweeper.purge_expired();
            if purged > 0 {
                tracing::info!("Purged {} expired sessions", purged);
            }
        }
    });

    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Resolve the caller's session id and session from the cookie
fn current_session(state: &AppState, jar: &CookieJar) -> Option<(String, Session)> {
    let session_id = jar.get(SESSION_COOKIE)?.value().to_string();
    let session = state.sessions.validate(&session_id)?;
    Some((session_id, session))
}

fn require_session(state: &AppState, jar: &CookieJar) -> Result<(String, Session), AppError> {
    current_session(state, jar).ok_or(AppError::Unauthorized)
}

fn require_educator(state: &AppState, jar: &CookieJar) -> Result<(String, Session), AppError> {
    let (session_id, session) = require_session(state, jar)?;
    if session.role != Role::Educator {
        return Err(AppError::Forbidden);
    }
    Ok((session_id, session))
}

async fn serve_landing(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let session = current_session(&state, &jar).map(|(_, session)| session);
    match LandingState::SessionCheck.resolve(session.as_ref()) {
        (_, Some(destination)) => Redirect::to(destination.path()).into_response(),
        (_, None) => Html(include_str!("./static/landing.html")).into_response(),
    }
}

async fn serve_not_found() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::NOT_FOUND,
        Html(include_str!("./static/not_found.html")),
    )
}

async fn serve_student_dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    serve_dashboard(state, jar, Route::StudentDashboard).await
}

async fn serve_educator_dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    serve_dashboard(state, jar, Route::EducatorDashboard).await
}

/// Render a dashboard with a freshly fetched listing.
///
/// Each visit starts a new listing session: new snapshot, default view.
async fn serve_dashboard(state: Arc<AppState>, jar: CookieJar, route: Route) -> Response {
    let current = current_session(&state, &jar);
    if let Access::Redirect(to) = guard(route, current.as_ref().map(|(_, session)| session)) {
        return Redirect::to(to.path()).into_response();
    }
    let Some((session_id, session)) = current else {
        return Redirect::to(Route::Landing.path()).into_response();
    };

    let (notes, error) = match state.client.fetch_notes(&session.user_id).await {
        Ok(notes) => (notes, None),
        Err(e) => {
            tracing::error!("Loading notes for {} failed: {}", session.user_id, e);
            (Vec::new(), Some(LOAD_FAILED_MESSAGE))
        }
    };

    let page = state.open_listing(&session_id, ListingSession::new(notes));

    let data = serde_json::json!({
        "user": {
            "label": session.display_label(),
            "role": session.role,
            "badge": session.role.badge(),
            "canEdit": session.role == Role::Educator,
        },
        "listing": page,
        "error": error,
        "uploadProgress": {
            "link": UploadMethod::Link.progress_message(),
            "file": UploadMethod::File.progress_message(),
        },
    });

    inject_page_data(include_str!("./static/dashboard.html"), "DASHBOARD", &data).into_response()
}

/// Serialize `data` for an inline script. Characters that could end the
/// script element or break a JS string are written as unicode escapes.
pub fn script_json(data: &Value) -> String {
    let raw = data.to_string();
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Expose `data` to a page template as `const <name>`
pub(crate) fn inject_page_data(template: &str, name: &str, data: &Value) -> Html<String> {
    Html(template.replace(
        "</head>",
        &format!(
            "    <script>const {} = {};</script>\n</head>",
            name,
            script_json(data)
        ),
    ))
}

/// Listing of the caller, opening one on first use
async fn listing_page(state: &AppState, session_id: &str, session: &Session) -> Result<ListingPage, AppError> {
    if let Some(page) = state.with_listing(session_id, |listing| listing.page()) {
        return Ok(page);
    }

    let notes = state
        .client
        .fetch_notes(&session.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Loading notes for {} failed: {}", session.user_id, e);
            AppError::Backend(LOAD_FAILED_MESSAGE.to_string())
        })?;
    Ok(state.open_listing(session_id, ListingSession::new(notes)))
}

async fn get_listing(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<ListingPage>, AppError> {
    let (session_id, session) = require_session(&state, &jar)?;
    Ok(Json(listing_page(&state, &session_id, &session).await?))
}

async fn update_view(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(update): Json<ViewUpdate>,
) -> Result<Json<ListingPage>, AppError> {
    let (session_id, session) = require_session(&state, &jar)?;
    listing_page(&state, &session_id, &session).await?;

    state
        .with_listing(&session_id, |listing| listing.apply(update))
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No listing is open".to_string()))
}

/// Re-fetch the snapshot, keeping the caller's view
async fn refresh(state: &AppState, session_id: &str, session: &Session) -> Result<ListingPage, AppError> {
    let notes = state
        .client
        .fetch_notes(&session.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Refreshing notes for {} failed: {}", session.user_id, e);
            AppError::Backend(LOAD_FAILED_MESSAGE.to_string())
        })?;

    match state.with_listing(session_id, |listing| listing.replace_notes(notes.clone())) {
        Some(page) => Ok(page),
        None => Ok(state.open_listing(session_id, ListingSession::new(notes))),
    }
}

async fn refresh_listing(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<ListingPage>, AppError> {
    let (session_id, session) = require_session(&state, &jar)?;
    Ok(Json(refresh(&state, &session_id, &session).await?))
}

async fn open_preview(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<crate::preview::PreviewState>, AppError> {
    let (session_id, _) = require_session(&state, &jar)?;

    let opened = state
        .with_listing(&session_id, |listing| {
            listing
                .open_preview(&request.key)
                .map(|opened| (opened, listing.preview().clone()))
        })
        .flatten();

    match opened {
        Some((true, preview)) => Ok(Json(preview)),
        Some((false, _)) => Err(AppError::Unprocessable(
            "No preview is available for this note".to_string(),
        )),
        None => Err(AppError::NotFound(format!("No note with key {}", request.key))),
    }
}

async fn close_preview(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<StatusCode, AppError> {
    let (session_id, _) = require_session(&state, &jar)?;
    state.with_listing(&session_id, |listing| listing.close_preview());
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_note(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<MutationResponse>, AppError> {
    let (session_id, session) = require_educator(&state, &jar)?;

    state.client.delete_note(&id).await.map_err(|e| {
        tracing::error!("Deleting note {} failed: {}", id, e);
        AppError::Backend(DELETE_FAILED_MESSAGE.to_string())
    })?;

    let page = refresh(&state, &session_id, &session).await?;
    Ok(Json(MutationResponse {
        message: DELETED_MESSAGE,
        status: None,
        page,
    }))
}

/// Read the upload form into a draft
async fn read_upload_draft(
    mut multipart: Multipart,
    limit: usize,
) -> Result<UploadDraft, AppError> {
    let mut draft = UploadDraft::default();
    let rejected = |e: MultipartError| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::TooLarge(limit),
        _ => AppError::BadRequest(e.body_text()),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(rejected)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(rejected)?;
                if !bytes.is_empty() {
                    draft.file = Some(FileAttachment {
                        name: file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "educatorName" | "batchName" | "uploadMethod" | "fileUrl" => {
                let value = field
                    .text()
                    .await
                    .map_err(rejected)?;
                match name.as_str() {
                    "educatorName" => draft.educator_name = value,
                    "batchName" => draft.batch_name = value,
                    "fileUrl" => draft.file_url = value,
                    _ => {
                        draft.method = value.parse().map_err(AppError::BadRequest)?;
                    }
                }
            }
            other => tracing::debug!("Ignoring upload field {}", other),
        }
    }

    Ok(draft)
}

async fn check_upload_link(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LinkQuery>,
) -> Result<Json<LinkCheck>, AppError> {
    require_educator(&state, &jar)?;

    let draft = UploadDraft {
        file_url: query.url.trim().to_string(),
        ..Default::default()
    };
    let status = draft.link_status();
    Ok(Json(LinkCheck {
        status,
        indicator: status.indicator(),
        preview: draft.inline_preview(),
    }))
}

async fn upload_note(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Json<MutationResponse>, AppError> {
    let (session_id, session) = require_educator(&state, &jar)?;

    let draft = read_upload_draft(multipart, state.config.max_upload_bytes).await?;
    let submission = draft.validate()?.into_submission(&session, Utc::now());

    let mut phase = UploadPhase::default();
    phase.submit(submission.payload.method());
    tracing::info!(
        "{} ({})",
        phase.message().unwrap_or_default(),
        session.user_id
    );

    let result = state.client.submit_upload(submission).await.map_err(|e| {
        tracing::error!("Upload for {} failed: {}", session.user_id, e);
        UploadError::Failed
    });
    phase.finish(&result);

    if let UploadPhase::Failed { message } = &phase {
        return Err(AppError::Backend(message.clone()));
    }

    let page = refresh(&state, &session_id, &session).await?;
    Ok(Json(MutationResponse {
        message: UPLOADED_MESSAGE,
        status: phase.message().map(str::to_string),
        page,
    }))
}
