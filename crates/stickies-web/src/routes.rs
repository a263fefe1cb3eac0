use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use stickies_core::composer::{save_draft, Composer, ComposerError};
use stickies_core::gallery::Gallery;
use stickies_core::gateway::Gateway;
use stickies_core::media::ImageFile;
use stickies_core::notify::{Notice, Notifier};
use stickies_core::repository::NoteRepository;
use stickies_core::share::{ShareResolver, ShareView};
use stickies_core::{Note, NoteColor, NoteId};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::flash::{NoticeBoard, PageClipboard};
use crate::render::{self, HomePage};

/// Room for a maximum-size image plus the rest of the form, so oversized
/// files still reach validation instead of failing at the extractor.
const FORM_BODY_LIMIT: usize = 12 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    gateway: Gateway,
    repository: NoteRepository,
    share: ShareResolver,
    gallery: Arc<RwLock<Gallery>>,
    composer: Arc<Mutex<Composer>>,
    notices: Arc<NoticeBoard>,
    clipboard: Arc<PageClipboard>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, AppError> {
        let gateway = Gateway::connect(&config.gateway, &config.local_blob_base_url())?;
        Ok(Self::new(config, gateway))
    }

    pub fn new(config: Arc<AppConfig>, gateway: Gateway) -> Self {
        let repository = gateway.repository();
        Self {
            share: ShareResolver::new(repository.clone(), config.public_origin.clone()),
            repository,
            gateway,
            gallery: Arc::new(RwLock::new(Gallery::new())),
            composer: Arc::new(Mutex::new(Composer::new())),
            notices: Arc::new(NoticeBoard::default()),
            clipboard: Arc::new(PageClipboard::default()),
            config,
        }
    }

    /// Reload the gallery without holding its lock across the request.
    async fn refresh_gallery(&self) {
        let result = self.repository.list_notes().await;
        if let Err(error) = self.gallery.write().await.apply_load(result) {
            tracing::warn!(%error, "Failed to load notes");
            self.notices.notify(Notice::from_error(&error));
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(home))
        .route("/note/{id}", get(shared_note))
        .route("/composer/open", post(open_composer))
        .route("/composer/cancel", post(cancel_composer))
        .route(
            "/composer/draft",
            post(submit_draft).layer(DefaultBodyLimit::max(FORM_BODY_LIMIT)),
        )
        .route("/notes/{id}/delete", post(delete_note_form))
        .route("/notes/{id}/share", post(share_note_form))
        .route("/blobs/{key}", get(local_blob));

    let api = Router::new()
        .route("/notes", get(list_notes_api))
        .route("/notes/{id}", get(get_note_api).delete(delete_note_api));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(pages)
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    storage: &'static str,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        storage: if state.gateway.local().is_some() {
            "memory"
        } else {
            "supabase"
        },
    })
}

async fn home(State(state): State<AppState>) -> Html<String> {
    state.refresh_gallery().await;

    let gallery = state.gallery.read().await.clone();
    let composer = state.composer.lock().await.clone();
    let notices = state.notices.drain();
    let copied_link = state.clipboard.take();

    Html(render::home_page(&HomePage {
        gallery: &gallery,
        composer: &composer,
        notices: &notices,
        copied_link: copied_link.as_deref(),
    }))
}

async fn shared_note(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.share.resolve(&id).await {
        ShareView::Found(note) => Html(render::note_page(&note)).into_response(),
        ShareView::NotFound | ShareView::Loading => {
            (StatusCode::NOT_FOUND, Html(render::not_found_page())).into_response()
        }
    }
}

async fn open_composer(State(state): State<AppState>) -> Redirect {
    state.composer.lock().await.open();
    Redirect::to("/")
}

async fn cancel_composer(State(state): State<AppState>) -> Redirect {
    if let Err(error) = state.composer.lock().await.cancel() {
        state
            .notices
            .notify(Notice::error("Can't cancel yet", error.to_string()));
    }
    Redirect::to("/")
}

/// Fields of the composer form.
#[derive(Debug, Default)]
struct DraftForm {
    content: Option<String>,
    color: Option<String>,
    image: Option<ImageFile>,
    clear_image: bool,
    save: bool,
}

impl DraftForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|error| AppError::bad_request(error.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let declared = field.content_type().map(str::to_string);
                    let bytes: Bytes = field
                        .bytes()
                        .await
                        .map_err(|error| AppError::bad_request(error.body_text()))?;
                    // Browsers send an empty part when no file was picked.
                    if !file_name.is_empty() || !bytes.is_empty() {
                        form.image = Some(ImageFile::new(
                            file_name,
                            declared.as_deref(),
                            bytes.to_vec(),
                        ));
                    }
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|error| AppError::bad_request(error.body_text()))?;
                    match name.as_str() {
                        "content" => form.content = Some(value),
                        "color" => form.color = Some(value),
                        "clear_image" => form.clear_image = !value.is_empty(),
                        "intent" => form.save = value == "save",
                        _ => {}
                    }
                }
            }
        }
        Ok(form)
    }
}

async fn submit_draft(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let form = DraftForm::read(multipart).await?;

    let draft = {
        let mut composer = state.composer.lock().await;
        composer.open();
        if let Err(error) = apply_draft_form(
            &mut composer,
            form.content,
            form.color,
            form.clear_image,
            form.image,
        ) {
            // Rejected input never reaches the gateway; the draft is kept.
            report_composer_error(&state, &error);
            return Ok(Redirect::to("/"));
        }
        if !form.save {
            return Ok(Redirect::to("/"));
        }
        match composer.begin_commit() {
            Ok(draft) => draft,
            Err(error) => {
                report_composer_error(&state, &error);
                return Ok(Redirect::to("/"));
            }
        }
    };

    let uploader = state.gateway.uploader();
    let outcome = save_draft(&draft, &state.repository, &uploader).await;

    let finished = state.composer.lock().await.finish_commit(outcome);
    match finished {
        Ok(note) => {
            tracing::info!(note_id = %note.id, "Created note");
            state.gallery.write().await.note_created(note);
            state.notices.notify(Notice::note_created());
        }
        Err(error) => report_composer_error(&state, &error),
    }
    Ok(Redirect::to("/"))
}

/// Copy form fields into the open draft. Content and color are applied even
/// when the image is rejected.
fn apply_draft_form(
    composer: &mut Composer,
    content: Option<String>,
    color: Option<String>,
    clear_image: bool,
    image: Option<ImageFile>,
) -> Result<(), ComposerError> {
    if let Some(content) = content {
        composer.edit_content(content)?;
    }
    if let Some(color) = color {
        let color = color
            .parse::<NoteColor>()
            .map_err(|error| ComposerError::Note(error.into()))?;
        composer.set_color(color)?;
    }
    if clear_image {
        composer.clear_image()?;
    }
    if let Some(image) = image {
        composer.attach_image(image)?;
    }
    Ok(())
}

fn report_composer_error(state: &AppState, error: &ComposerError) {
    let notice = match error.note_error() {
        Some(error) => Notice::from_error(error),
        None => Notice::error("Please wait", error.to_string()),
    };
    tracing::debug!(%error, "Composer action refused");
    state.notices.notify(notice);
}

async fn delete_note_form(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let Ok(id) = id.parse::<NoteId>() else {
        state
            .notices
            .notify(Notice::error("Note not found", "This note doesn't exist."));
        return Redirect::to("/");
    };

    let result = state.repository.delete_note(&id).await;
    match state.gallery.write().await.apply_delete(&id, result) {
        Ok(()) => state.notices.notify(Notice::note_deleted()),
        Err(error) => {
            tracing::warn!(note_id = %id, %error, "Failed to delete note");
            state.notices.notify(Notice::from_error(&error));
        }
    }
    Redirect::to("/")
}

async fn share_note_form(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    match id.parse::<NoteId>() {
        Ok(id) => {
            state
                .share
                .copy_share_link(&id, state.clipboard.as_ref(), state.notices.as_ref());
        }
        Err(_) => state
            .notices
            .notify(Notice::error("Note not found", "This note doesn't exist.")),
    }
    Redirect::to("/")
}

async fn local_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let memory = state
        .gateway
        .local()
        .ok_or_else(|| AppError::NotFound("blobs are served by the storage gateway".to_string()))?;
    let blob = memory
        .blob(&key)
        .await
        .ok_or_else(|| AppError::NotFound(format!("blob '{key}'")))?;
    Ok(([(header::CONTENT_TYPE, blob.content_type)], blob.bytes).into_response())
}

async fn list_notes_api(State(state): State<AppState>) -> Result<Json<Vec<Note>>, AppError> {
    Ok(Json(state.repository.list_notes().await?))
}

fn parse_note_id(raw: &str) -> Result<NoteId, AppError> {
    raw.parse()
        .map_err(|_| AppError::bad_request(format!("'{raw}' is not a note id")))
}

async fn get_note_api(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, AppError> {
    let id = parse_note_id(&id)?;
    Ok(Json(state.repository.get_note(&id).await?))
}

async fn delete_note_api(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_note_id(&id)?;
    let result = state.repository.delete_note(&id).await;
    state.gallery.write().await.apply_delete(&id, result)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use reqwest::multipart::{Form, Part};
    use stickies_core::gateway::InMemoryGateway;
    use stickies_core::media::MAX_IMAGE_BYTES;

    use super::*;
    use crate::config::AppConfig;

    struct TestApp {
        base: String,
        memory: InMemoryGateway,
        client: reqwest::Client,
    }

    impl TestApp {
        async fn spawn() -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let base = format!("http://{addr}");

            let config = AppConfig::from_lookup(|name| match name {
                "STICKIES_PUBLIC_ORIGIN" => Some(base.clone()),
                _ => None,
            })
            .unwrap();
            let memory = InMemoryGateway::new(&config.local_blob_base_url());
            let state = AppState::new(Arc::new(config), Gateway::in_memory(memory.clone()));

            tokio::spawn(async move {
                axum::serve(listener, app_router(state)).await.unwrap();
            });

            Self {
                base,
                memory,
                client: reqwest::Client::new(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.base)
        }

        async fn post(&self, path: &str) -> String {
            self.client
                .post(self.url(path))
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap()
        }

        async fn submit(&self, form: Form) -> String {
            self.client
                .post(self.url("/composer/draft"))
                .multipart(form)
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap()
        }

        async fn notes(&self) -> Vec<Note> {
            self.client
                .get(self.url("/api/notes"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap()
        }
    }

    fn png(size: usize) -> Part {
        Part::bytes(vec![0u8; size])
            .file_name("photo.png")
            .mime_str("image/png")
            .unwrap()
    }

    #[tokio::test]
    async fn healthz_reports_memory_storage() {
        let app = TestApp::spawn().await;
        let body: serde_json::Value = app
            .client
            .get(app.url("/healthz"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "memory");
    }

    #[tokio::test]
    async fn empty_gallery_invites_first_note() {
        let app = TestApp::spawn().await;
        let page = app
            .client
            .get(app.url("/"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains("No notes yet"));
        assert!(page.contains("/composer/open"));
    }

    #[tokio::test]
    async fn saved_note_is_listed_and_shareable() {
        let app = TestApp::spawn().await;
        app.post("/composer/open").await;
        let page = app
            .submit(
                Form::new()
                    .text("content", "Hello")
                    .text("color", "#dcfce7")
                    .text("intent", "save"),
            )
            .await;
        assert!(page.contains("Note created!"));
        assert!(page.contains("background:#dcfce7"));

        let notes = app.notes().await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text(), "Hello");
        assert_eq!(notes[0].color, NoteColor::Green);

        let page = app.post(&format!("/notes/{}/share", notes[0].id)).await;
        let link = format!("{}/note/{}", app.base, notes[0].id);
        assert!(page.contains(&link));

        let shared = app.client.get(&link).send().await.unwrap();
        assert_eq!(shared.status(), StatusCode::OK);
        let shared = shared.text().await.unwrap();
        assert!(shared.contains("Hello"));
        assert!(shared.contains("#dcfce7"));
    }

    #[tokio::test]
    async fn newer_notes_come_first() {
        let app = TestApp::spawn().await;
        for text in ["first", "second"] {
            app.submit(
                Form::new()
                    .text("content", text)
                    .text("intent", "save"),
            )
            .await;
        }
        let texts: Vec<String> = app
            .notes()
            .await
            .iter()
            .map(|note| note.text().to_string())
            .collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn empty_draft_is_refused() {
        let app = TestApp::spawn().await;
        let page = app
            .submit(Form::new().text("content", "   ").text("intent", "save"))
            .await;
        assert!(page.contains("Invalid note"));
        assert!(app.notes().await.is_empty());
    }

    #[tokio::test]
    async fn oversized_image_is_rejected_before_upload() {
        let app = TestApp::spawn().await;
        let size = usize::try_from(MAX_IMAGE_BYTES).unwrap() + 1;
        let page = app
            .submit(
                Form::new()
                    .text("content", "big")
                    .part("image", png(size))
                    .text("intent", "preview"),
            )
            .await;
        assert!(page.contains("File too large"));
        assert_eq!(app.memory.blob_count().await, 0);
    }

    #[tokio::test]
    async fn oversized_image_blocks_save() {
        let app = TestApp::spawn().await;
        let size = usize::try_from(MAX_IMAGE_BYTES).unwrap() + 1;
        let page = app
            .submit(
                Form::new()
                    .text("content", "caption")
                    .part("image", png(size))
                    .text("intent", "save"),
            )
            .await;
        assert!(page.contains("File too large"));
        assert!(!page.contains("Note created!"));
        assert!(page.contains("caption"));
        assert!(app.notes().await.is_empty());
        assert_eq!(app.memory.note_count().await, 0);
        assert_eq!(app.memory.blob_count().await, 0);
    }

    #[tokio::test]
    async fn failed_upload_keeps_draft_and_creates_nothing() {
        let app = TestApp::spawn().await;
        app.memory.set_blobs_offline(true);
        let page = app
            .submit(
                Form::new()
                    .text("content", "with picture")
                    .part("image", png(32))
                    .text("intent", "save"),
            )
            .await;
        assert!(page.contains("Upload failed"));
        assert!(page.contains("with picture"));
        assert!(page.contains("data:image/png;base64,"));
        assert!(app.notes().await.is_empty());
    }

    #[tokio::test]
    async fn uploaded_image_is_served_locally() {
        let app = TestApp::spawn().await;
        app.submit(
            Form::new()
                .part("image", png(8))
                .text("intent", "save"),
        )
        .await;
        let notes = app.notes().await;
        let image_url = notes[0].image_url.clone().unwrap();
        assert!(image_url.starts_with(&app.url("/blobs/")));

        let response = app.client.get(&image_url).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.bytes().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn delete_removes_note_and_unknown_id_is_harmless() {
        let app = TestApp::spawn().await;
        for text in ["keep", "drop"] {
            app.submit(Form::new().text("content", text).text("intent", "save"))
                .await;
        }
        let drop_id = app.notes().await[0].id;

        let page = app
            .post(&format!("/notes/{}/delete", uuid::Uuid::new_v4()))
            .await;
        assert!(page.contains("keep") && page.contains("drop"));

        let page = app.post(&format!("/notes/{drop_id}/delete")).await;
        assert!(page.contains("Note deleted"));
        let texts: Vec<String> = app
            .notes()
            .await
            .iter()
            .map(|note| note.text().to_string())
            .collect();
        assert_eq!(texts, vec!["keep"]);
    }

    #[tokio::test]
    async fn unknown_shared_note_renders_not_found() {
        let app = TestApp::spawn().await;
        for path in [
            format!("/note/{}", uuid::Uuid::new_v4()),
            "/note/not-a-uuid".to_string(),
        ] {
            let response = app.client.get(app.url(&path)).send().await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert!(response.text().await.unwrap().contains("Note not found"));
        }
    }

    #[tokio::test]
    async fn json_api_maps_errors_to_statuses() {
        let app = TestApp::spawn().await;
        let missing = app
            .client
            .get(app.url(&format!("/api/notes/{}", uuid::Uuid::new_v4())))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let malformed = app
            .client
            .get(app.url("/api/notes/nope"))
            .send()
            .await
            .unwrap();
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

        app.memory.set_records_offline(true);
        let offline = app.client.get(app.url("/api/notes")).send().await.unwrap();
        assert_eq!(offline.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = offline.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn api_delete_is_idempotent() {
        let app = TestApp::spawn().await;
        app.submit(Form::new().text("content", "bye").text("intent", "save"))
            .await;
        let id = app.notes().await[0].id;
        for _ in 0..2 {
            let response = app
                .client
                .delete(app.url(&format!("/api/notes/{id}")))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
        assert!(app.notes().await.is_empty());
    }
}
