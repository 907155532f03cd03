use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use storage::{
    CompetitionStore, MemoryStore,
    dto::competition::CompetitionQuery,
    models::{CompetitionListing, MainCategory, NewCompetition, SubCategory, User},
    token,
};
use tower::ServiceExt;

use crate::media::{MediaUploader, PosterPayload, UploadError, UploadedMedia};
use crate::routes;
use crate::state::AppState;

#[derive(Default)]
struct RecordingUploader {
    folders: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaUploader for RecordingUploader {
    async fn upload(
        &self,
        folder: &str,
        _poster: &PosterPayload,
    ) -> Result<UploadedMedia, UploadError> {
        self.folders.lock().unwrap().push(folder.to_string());
        Ok(UploadedMedia {
            public_id: format!("{folder}/poster"),
            secure_url: format!("https://media.example.com{folder}/poster.png"),
            format: Some("png".into()),
            width: Some(800),
            height: Some(1200),
            extra: serde_json::Map::new(),
        })
    }
}

struct FailingUploader;

#[async_trait]
impl MediaUploader for FailingUploader {
    async fn upload(&self, _: &str, _: &PosterPayload) -> Result<UploadedMedia, UploadError> {
        Err(UploadError::Rejected {
            status: 500,
            body: "boom".into(),
        })
    }
}

struct SlowUploader;

#[async_trait]
impl MediaUploader for SlowUploader {
    async fn upload(&self, _: &str, _: &PosterPayload) -> Result<UploadedMedia, UploadError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Err(UploadError::Rejected {
            status: 500,
            body: "too late".into(),
        })
    }
}

/// Uploader that succeeds after a fixed delay
struct DelayedUploader {
    delay: Duration,
    calls: Mutex<u32>,
}

#[async_trait]
impl MediaUploader for DelayedUploader {
    async fn upload(&self, folder: &str, _: &PosterPayload) -> Result<UploadedMedia, UploadError> {
        *self.calls.lock().unwrap() += 1;
        tokio::time::sleep(self.delay).await;
        Ok(UploadedMedia {
            public_id: format!("{folder}/poster"),
            secure_url: format!("https://media.example.com{folder}/poster.png"),
            format: None,
            width: None,
            height: None,
            extra: serde_json::Map::new(),
        })
    }
}

/// Store whose credential lookup is slow; everything else is delegated.
struct SlowLookupStore {
    inner: Arc<MemoryStore>,
    delay: Duration,
}

#[async_trait]
impl CompetitionStore for SlowLookupStore {
    async fn fetch_competitions(
        &self,
        query: &CompetitionQuery,
    ) -> storage::error::Result<Vec<CompetitionListing>> {
        self.inner.fetch_competitions(query).await
    }

    async fn count_competitions(&self, query: &CompetitionQuery) -> storage::error::Result<i64> {
        self.inner.count_competitions(query).await
    }

    async fn find_competition(&self, id: i64) -> storage::error::Result<CompetitionListing> {
        self.inner.find_competition(id).await
    }

    async fn insert_competition(
        &self,
        competition: &NewCompetition,
    ) -> storage::error::Result<i64> {
        self.inner.insert_competition(competition).await
    }

    async fn find_user_by_key(&self, user_key: &str) -> storage::error::Result<Option<User>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_user_by_key(user_key).await
    }
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.add_user(User {
        id: 1,
        username: "alice".into(),
        user_key: "key-alice".into(),
    });
    store.add_main_category(MainCategory {
        id: 1,
        name: "Desain".into(),
    });
    store.add_sub_category(SubCategory {
        id: 3,
        main_category_id: 1,
        name: "Poster".into(),
    });
    Arc::new(store)
}

fn app_with(
    store: Arc<dyn CompetitionStore>,
    uploader: Arc<dyn MediaUploader>,
    timeout: Duration,
) -> Router {
    routes::router(AppState {
        store,
        uploader,
        request_timeout: timeout,
        media_root: Arc::from("/kompetisi-id/competition"),
    })
}

fn app(store: Arc<dyn CompetitionStore>, uploader: Arc<dyn MediaUploader>) -> Router {
    app_with(store, uploader, Duration::from_secs(5))
}

fn record(title: &str, status: &str) -> NewCompetition {
    let at = NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    NewCompetition {
        user_id: 1,
        title: title.into(),
        sort: String::new(),
        organizer: "Kompetisi".into(),
        deadline_at: at.date(),
        announcement_at: at.date(),
        main_category_id: 1,
        sub_category_id: None,
        content: String::new(),
        prize_total: Decimal::ZERO,
        prize_description: String::new(),
        contact: String::new(),
        is_guaranteed: false,
        is_media_partner: false,
        is_managed: false,
        is_draft: false,
        source_link: String::new(),
        register_link: String::new(),
        announcements: String::new(),
        tags: String::new(),
        status: status.into(),
        poster: None,
        views: 1,
        created_at: at,
        updated_at: at,
    }
}

fn create_payload() -> Value {
    json!({
        "title": "Lomba Desain Poster Nasional",
        "description": "Terbuka untuk mahasiswa",
        "organizer": "Himpunan Desain",
        "deadline_date": "2024-08-17",
        "main_cat": 1,
        "sub_cat": 3,
        "content": "<p>Ketentuan lomba</p>",
        "prize_total": "5000000",
        "prize_description": "Juara 1, 2, 3",
        "contacts": "panitia@example.com",
        "is_guaranteed": true,
        "is_mediapartner": false,
        "draft": true,
        "register_link": "https://example.com/daftar",
        "tags": "desain,poster",
        "status": "waiting",
        "poster": "data:image/png;base64,iVBORw0KGgo="
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(user_key: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/competitions")
        .header("content-type", "application/json");
    if let Some(key) = user_key {
        builder = builder.header("userKey", key);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_list_draft_page_two() {
    let store = seeded_store();
    let mut draft_ids = Vec::new();
    for i in 1..=12 {
        draft_ids.push(
            store
                .insert_competition(&record(&format!("Draft {i}"), "draft"))
                .await
                .unwrap(),
        );
        if i % 4 == 0 {
            store
                .insert_competition(&record(&format!("Posted {i}"), "posted"))
                .await
                .unwrap();
        }
    }

    let (status, body) = send(
        app(store, Arc::new(RecordingUploader::default())),
        get("/api/competitions?status=draft&page=2&limit=5"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["message"], "Success");
    assert_eq!(body["data"]["total"], 12);

    let expected: Vec<Value> = draft_ids
        .iter()
        .rev()
        .skip(5)
        .take(5)
        .map(|id| Value::from(token::obfuscate(*id as u64)))
        .collect();
    let ids: Vec<Value> = body["data"]["competitions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].clone())
        .collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_list_defaults_to_posted_and_tolerates_bad_numbers() {
    let store = seeded_store();
    store
        .insert_competition(&record("Posted", "posted"))
        .await
        .unwrap();
    store
        .insert_competition(&record("Draft", "draft"))
        .await
        .unwrap();

    let (status, body) = send(
        app(store, Arc::new(RecordingUploader::default())),
        get("/api/competitions?page=abc&limit=abc&id_main_category=x"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["competitions"][0]["title"], "Posted");
    assert_eq!(body["data"]["competitions"][0]["main_category"]["name"], "Desain");
}

#[tokio::test]
async fn test_empty_listing_is_no_content() {
    let (status, body) = send(
        app(seeded_store(), Arc::new(RecordingUploader::default())),
        get("/api/competitions?status=archived"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 204);
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["competitions"], json!([]));
}

#[tokio::test]
async fn test_listing_storage_failure_is_server_fault() {
    let store = seeded_store();
    store.set_unavailable(true);

    let (status, body) = send(
        app(store, Arc::new(RecordingUploader::default())),
        get("/api/competitions"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
}

#[tokio::test]
async fn test_create_end_to_end() {
    let store = seeded_store();
    let uploader = Arc::new(RecordingUploader::default());

    let (status, body) = send(
        app(store.clone(), uploader.clone()),
        post(Some("key-alice"), create_payload().to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], 201);

    let id_token = body["data"]["id"].as_str().unwrap();
    let id = token::deobfuscate(id_token).unwrap() as i64;
    let saved = store.get(id).expect("competition persisted");

    assert_eq!(saved.views, 1);
    assert_eq!(saved.created_at, saved.updated_at);
    assert!(saved.is_guaranteed);
    assert!(!saved.is_media_partner);
    assert!(saved.is_draft);
    assert!(!saved.is_managed);
    assert_eq!(saved.user_id, 1);
    assert_eq!(saved.sub_category_id, Some(3));
    assert_eq!(saved.announcement_at, saved.deadline_at);
    assert_eq!(saved.status, "waiting");

    let expected_folder = format!("/kompetisi-id/competition/alice/{}", Local::now().year());
    assert_eq!(*uploader.folders.lock().unwrap(), vec![expected_folder.clone()]);
    assert_eq!(
        saved.poster.as_ref().unwrap()["public_id"],
        format!("{expected_folder}/poster")
    );
}

#[tokio::test]
async fn test_create_then_fetch_by_token() {
    let store = seeded_store();
    let uploader: Arc<dyn MediaUploader> = Arc::new(RecordingUploader::default());

    let (_, created) = send(
        app(store.clone(), uploader.clone()),
        post(Some("key-alice"), create_payload().to_string()),
    )
    .await;
    let id_token = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app(store, uploader),
        get(&format!("/api/competitions/{id_token}")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id_token);
    assert_eq!(body["data"]["author"], "alice");
    assert_eq!(body["data"]["sub_category"]["name"], "Poster");
    assert_eq!(body["data"]["tags"], json!(["desain", "poster"]));
    assert_eq!(body["data"]["is_draft"], true);
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let (status, body) = send(
        app(seeded_store(), Arc::new(RecordingUploader::default())),
        get(&format!("/api/competitions/{}", token::obfuscate(999))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    let (status, _) = send(
        app(seeded_store(), Arc::new(RecordingUploader::default())),
        get("/api/competitions/not-a-token"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_requires_user_key() {
    let store = seeded_store();
    let uploader = Arc::new(RecordingUploader::default());

    let (status, body) = send(
        app(store.clone(), uploader.clone()),
        post(None, create_payload().to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Please login first");

    let (status, _) = send(
        app(store.clone(), uploader.clone()),
        post(Some("stolen"), create_payload().to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert!(uploader.folders.lock().unwrap().is_empty());
    assert!(store.get(1).is_none());
}

#[tokio::test]
async fn test_create_rejects_undecodable_body() {
    let (status, body) = send(
        app(seeded_store(), Arc::new(RecordingUploader::default())),
        post(Some("key-alice"), "{\"title\": ".to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["message"], "Error parsing payload");
}

#[tokio::test]
async fn test_create_rejects_invalid_payload() {
    let mut payload = create_payload();
    payload["title"] = json!("");

    let (status, body) = send(
        app(seeded_store(), Arc::new(RecordingUploader::default())),
        post(Some("key-alice"), payload.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");

    let mut payload = create_payload();
    payload["poster"] = json!("data:image/png,raw");
    let (status, _) = send(
        app(seeded_store(), Arc::new(RecordingUploader::default())),
        post(Some("key-alice"), payload.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_upload_failure() {
    let store = seeded_store();
    let (status, body) = send(
        app(store.clone(), Arc::new(FailingUploader)),
        post(Some("key-alice"), create_payload().to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], 502);
    assert!(store.get(1).is_none());
}

#[tokio::test]
async fn test_create_insert_failure() {
    let mut payload = create_payload();
    payload["main_cat"] = json!(42);

    let (status, body) = send(
        app(seeded_store(), Arc::new(RecordingUploader::default())),
        post(Some("key-alice"), payload.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
}

#[tokio::test]
async fn test_create_deadline() {
    let (status, body) = send(
        app_with(
            seeded_store(),
            Arc::new(SlowUploader),
            Duration::from_millis(50),
        ),
        post(Some("key-alice"), create_payload().to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["status"], 504);
}

#[tokio::test]
async fn test_create_shares_one_deadline_across_lookup_and_upload() {
    let memory = seeded_store();
    let store = Arc::new(SlowLookupStore {
        inner: memory.clone(),
        delay: Duration::from_millis(300),
    });
    let uploader = Arc::new(DelayedUploader {
        delay: Duration::from_millis(300),
        calls: Mutex::new(0),
    });

    let (status, body) = send(
        app_with(store, uploader.clone(), Duration::from_millis(500)),
        post(Some("key-alice"), create_payload().to_string()),
    )
    .await;

    assert_eq!(*uploader.calls.lock().unwrap(), 1);
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["status"], 504);
    assert!(memory.get(1).is_none());
}
