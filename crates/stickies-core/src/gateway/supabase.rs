//! Supabase backend: PostgREST for note rows, Storage for images.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{BlobStore, NoteStore};
use crate::models::{NewNote, Note, NoteId};
use crate::util::{compact_text, is_http_url, sanitize};
use crate::{Error, Result};

const NOTE_COLUMNS: &str = "id,content,image_url,color,created_at";

/// Connection settings for a Supabase project.
#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anon key sent as `apikey` and bearer token.
    pub anon_key: String,
    /// Table holding note rows.
    pub notes_table: String,
    /// Public storage bucket holding note images.
    pub image_bucket: String,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("notes_table", &self.notes_table)
            .field("image_bucket", &self.image_bucket)
            .finish()
    }
}

/// HTTP client for a Supabase project's REST and Storage APIs.
#[derive(Debug, Clone)]
pub struct SupabaseGateway {
    base_url: String,
    anon_key: String,
    notes_table: String,
    image_bucket: String,
    client: Client,
}

impl SupabaseGateway {
    pub fn new(config: SupabaseConfig, timeout: Option<Duration>) -> Result<Self> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        if !is_http_url(&base_url) {
            return Err(Error::Config(
                "SUPABASE_URL must start with http:// or https://".to_string(),
            ));
        }
        let anon_key = config.anon_key.trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::Config(
                "SUPABASE_ANON_KEY must not be empty".to_string(),
            ));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|error| Error::Config(format!("Failed to construct HTTP client: {error}")))?;

        Ok(Self {
            base_url,
            anon_key,
            notes_table: config.notes_table,
            image_bucket: config.image_bucket,
            client,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.notes_table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn send_rows<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>> {
        let response = self
            .authorized(request)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| {
                Error::Repository(format!("Note {operation} request failed: {}", sanitize(&error)))
            })?;
        let response = ensure_success(response, |message| {
            Error::Repository(format!("Note {operation} {message}"))
        })
        .await?;
        response.json::<Vec<T>>().await.map_err(|error| {
            Error::Repository(format!(
                "Failed to parse note {operation} response: {}",
                sanitize(&error)
            ))
        })
    }
}

#[async_trait]
impl NoteStore for SupabaseGateway {
    async fn select_newest_first(&self) -> Result<Vec<Note>> {
        let request = self.client.get(self.table_url()).query(&[
            ("select", NOTE_COLUMNS),
            ("order", "created_at.desc"),
        ]);
        self.send_rows("select", request).await
    }

    async fn insert(&self, note: &NewNote) -> Result<Note> {
        let request = self
            .client
            .post(self.table_url())
            .query(&[("select", NOTE_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(note);
        self.send_rows::<Note>("insert", request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Repository("Note insert returned no row".to_string()))
    }

    async fn delete(&self, id: &NoteId) -> Result<bool> {
        let request = self
            .client
            .delete(self.table_url())
            .query(&[("id", format!("eq.{id}")), ("select", "id".to_string())])
            .header("Prefer", "return=representation");
        let removed = self.send_rows::<serde_json::Value>("delete", request).await?;
        Ok(!removed.is_empty())
    }

    async fn select_by_id(&self, id: &NoteId) -> Result<Option<Note>> {
        let request = self.client.get(self.table_url()).query(&[
            ("select", NOTE_COLUMNS.to_string()),
            ("id", format!("eq.{id}")),
            ("limit", "1".to_string()),
        ]);
        Ok(self.send_rows::<Note>("fetch", request).await?.into_iter().next())
    }
}

#[async_trait]
impl BlobStore for SupabaseGateway {
    async fn upload(&self, object_key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.image_bucket,
            urlencoding::encode(object_key)
        );
        let response = self
            .authorized(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|error| {
                Error::Upload(format!("Image upload request failed: {}", sanitize(&error)))
            })?;
        ensure_success(response, |message| {
            Error::Upload(format!("Image upload {message}"))
        })
        .await?;
        Ok(())
    }

    fn public_url(&self, object_key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.image_bucket,
            urlencoding::encode(object_key.trim_matches('/'))
        )
    }
}

async fn ensure_success(
    response: Response,
    to_error: impl FnOnce(String) -> Error,
) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(to_error(format!(
        "failed with HTTP {status}: {}",
        compact_text(&body)
    )))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::body::Bytes;
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::*;
    use crate::models::NoteColor;

    #[derive(Clone, Default)]
    struct Recorded {
        queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
        bodies: Arc<Mutex<Vec<Value>>>,
        uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
    }

    fn row(id: &str, content: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "content": content,
            "image_url": null,
            "color": "#dcfce7",
            "created_at": created_at,
        })
    }

    async fn spawn_fake_supabase(recorded: Recorded) -> String {
        async fn select(
            State(recorded): State<Recorded>,
            headers: HeaderMap,
            Query(query): Query<HashMap<String, String>>,
        ) -> std::result::Result<Json<Value>, StatusCode> {
            if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("anon") {
                return Err(StatusCode::UNAUTHORIZED);
            }
            let missing = query.get("id").is_some_and(|id| id.ends_with("0000000000ff"));
            recorded.queries.lock().unwrap().push(query);
            if missing {
                return Ok(Json(json!([])));
            }
            Ok(Json(json!([
                row("0190c3a4-7b1e-7cc0-8f00-000000000002", "newer", "2026-10-19T09:00:00+00:00"),
                row("0190c3a4-7b1e-7cc0-8f00-000000000001", "older", "2026-10-19T08:00:00+00:00"),
            ])))
        }

        async fn insert(
            State(recorded): State<Recorded>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> (StatusCode, Json<Value>) {
            assert_eq!(
                headers.get("prefer").and_then(|v| v.to_str().ok()),
                Some("return=representation")
            );
            let mut stored = body.clone();
            stored["id"] = json!("0190c3a4-7b1e-7cc0-8f00-000000000003");
            stored["created_at"] = json!("2026-10-19T10:00:00+00:00");
            recorded.bodies.lock().unwrap().push(body);
            (StatusCode::CREATED, Json(json!([stored])))
        }

        async fn delete(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
            if query.get("id").map(String::as_str) == Some("eq.0190c3a4-7b1e-7cc0-8f00-000000000001") {
                Json(json!([{ "id": "0190c3a4-7b1e-7cc0-8f00-000000000001" }]))
            } else {
                Json(json!([]))
            }
        }

        async fn upload(
            State(recorded): State<Recorded>,
            Path((bucket, key)): Path<(String, String)>,
            headers: HeaderMap,
            body: Bytes,
        ) -> StatusCode {
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            recorded
                .uploads
                .lock()
                .unwrap()
                .push((format!("{bucket}/{key}"), content_type, body.len()));
            StatusCode::OK
        }

        let router = Router::new()
            .route("/rest/v1/notes", get(select).post(insert).delete(delete))
            .route("/storage/v1/object/{bucket}/{key}", post(upload))
            .with_state(recorded);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn gateway(url: &str) -> SupabaseGateway {
        SupabaseGateway::new(
            SupabaseConfig {
                url: format!("{url}/"),
                anon_key: "anon".to_string(),
                notes_table: "notes".to_string(),
                image_bucket: "note-images".to_string(),
            },
            Some(Duration::from_secs(5)),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_invalid_url() {
        let err = SupabaseGateway::new(
            SupabaseConfig {
                url: "project.supabase.co".to_string(),
                anon_key: "anon".to_string(),
                notes_table: "notes".to_string(),
                image_bucket: "b".to_string(),
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(message) if message.contains("SUPABASE_URL")));
    }

    #[test]
    fn debug_redacts_anon_key() {
        let config = SupabaseConfig {
            url: "https://project.supabase.co".to_string(),
            anon_key: "secret-anon".to_string(),
            notes_table: "notes".to_string(),
            image_bucket: "b".to_string(),
        };
        let output = format!("{config:?}");
        assert!(!output.contains("secret-anon"));
        assert!(output.contains("[REDACTED]"));
    }

    #[test]
    fn public_url_points_at_public_bucket_path() {
        let gateway = gateway("https://project.supabase.co");
        assert_eq!(
            gateway.public_url("1700000000000-abc.png"),
            "https://project.supabase.co/storage/v1/object/public/note-images/1700000000000-abc.png"
        );
    }

    #[tokio::test]
    async fn select_requests_descending_order() {
        let recorded = Recorded::default();
        let url = spawn_fake_supabase(recorded.clone()).await;

        let notes = gateway(&url).select_newest_first().await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].text(), "newer");

        let queries = recorded.queries.lock().unwrap();
        assert_eq!(queries[0].get("order").map(String::as_str), Some("created_at.desc"));
    }

    #[tokio::test]
    async fn insert_sends_payload_and_returns_assigned_identity() {
        let recorded = Recorded::default();
        let url = spawn_fake_supabase(recorded.clone()).await;

        let new_note = NewNote::new(Some("Hello".to_string()), None, NoteColor::Green).unwrap();
        let note = gateway(&url).insert(&new_note).await.unwrap();

        assert_eq!(note.id.to_string(), "0190c3a4-7b1e-7cc0-8f00-000000000003");
        assert_eq!(note.color, NoteColor::Green);
        assert_eq!(
            recorded.bodies.lock().unwrap()[0],
            json!({ "content": "Hello", "image_url": null, "color": "#dcfce7" })
        );
    }

    #[tokio::test]
    async fn select_by_id_maps_empty_result_to_none() {
        let url = spawn_fake_supabase(Recorded::default()).await;
        let id: NoteId = "0190c3a4-7b1e-7cc0-8f00-0000000000ff".parse().unwrap();
        assert_eq!(gateway(&url).select_by_id(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let url = spawn_fake_supabase(Recorded::default()).await;
        let gateway = gateway(&url);
        let present: NoteId = "0190c3a4-7b1e-7cc0-8f00-000000000001".parse().unwrap();
        let absent: NoteId = "0190c3a4-7b1e-7cc0-8f00-000000000009".parse().unwrap();
        assert!(gateway.delete(&present).await.unwrap());
        assert!(!gateway.delete(&absent).await.unwrap());
    }

    #[tokio::test]
    async fn upload_posts_bytes_to_bucket() {
        let recorded = Recorded::default();
        let url = spawn_fake_supabase(recorded.clone()).await;

        gateway(&url)
            .upload("1700000000000-abc.png", b"png-bytes", "image/png")
            .await
            .unwrap();

        let uploads = recorded.uploads.lock().unwrap();
        assert_eq!(
            uploads[0],
            (
                "note-images/1700000000000-abc.png".to_string(),
                "image/png".to_string(),
                9
            )
        );
    }

    #[tokio::test]
    async fn http_failure_maps_to_repository_error() {
        let url = spawn_fake_supabase(Recorded::default()).await;
        let mut gateway = gateway(&url);
        gateway.anon_key = "wrong".to_string();

        let err = gateway.select_newest_first().await.unwrap_err();
        assert!(matches!(err, Error::Repository(message) if message.contains("HTTP 401")));
    }

    #[tokio::test]
    async fn unreachable_storage_maps_to_upload_error() {
        let gateway = gateway("http://127.0.0.1:9");
        let err = gateway
            .upload("a.png", b"x", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upload(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires SUPABASE_URL and SUPABASE_ANON_KEY plus network access"]
    async fn live_project_round_trips_a_note() {
        let _ = dotenvy::dotenv();

        let config = crate::config::GatewayConfig::from_env()
            .expect("gateway env parsing should not error")
            .supabase
            .expect("Supabase config should be present");
        let gateway = SupabaseGateway::new(config, Some(std::time::Duration::from_secs(20)))
            .expect("gateway should build");

        let draft = NewNote::new(
            Some("live gateway check".to_string()),
            None,
            crate::models::NoteColor::Teal,
        )
        .unwrap();
        let created = gateway.insert(&draft).await.unwrap();
        let fetched = gateway.select_by_id(&created.id).await.unwrap();
        assert_eq!(fetched.as_ref(), Some(&created));
        assert!(gateway.delete(&created.id).await.unwrap());
    }
}
