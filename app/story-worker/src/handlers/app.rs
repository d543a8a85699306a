//! Local app API used by the page.

use actix_web::{delete, get, post, web, HttpResponse};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::info;

use offline_sync::{Notification, Submission};
use story_gateway::{CredentialProvider, Credentials};
use story_model::{Coordinates, NewStory, Photo};

use crate::context::{PageContext, WorkerContext};
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    /// Base64 (standard alphabet) file contents.
    pub data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub description: String,
    pub photo: PhotoUpload,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl CreateStoryRequest {
    fn into_new_story(self) -> Result<NewStory> {
        let bytes = general_purpose::STANDARD
            .decode(self.photo.data.as_bytes())
            .map_err(|_| AppError::BadRequest("photo data is not valid base64".to_string()))?;
        let photo = Photo::new(self.photo.file_name, self.photo.content_type, bytes);
        let story = NewStory::new(self.description, photo)?;

        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(story.with_coordinates(Coordinates::new(lat, lon)?)),
            (None, None) => Ok(story),
            _ => Err(AppError::BadRequest(
                "lat and lon must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SubmissionResponse {
    Delivered { message: String },
    Queued { seq: i64, message: String },
}

#[derive(Debug, Serialize)]
struct BookmarkStatus {
    id: String,
    bookmarked: bool,
}

#[get("/feed")]
pub async fn get_feed(page: web::Data<PageContext>) -> HttpResponse {
    HttpResponse::Ok().json(page.feed.load().await)
}

#[post("/stories")]
pub async fn create_story(
    page: web::Data<PageContext>,
    body: web::Json<CreateStoryRequest>,
) -> Result<HttpResponse> {
    let story = body.into_inner().into_new_story()?;

    let response = match page.submit(story).await? {
        Submission::Delivered(accepted) => {
            HttpResponse::Created().json(SubmissionResponse::Delivered {
                message: accepted.message,
            })
        }
        Submission::Queued { seq } => HttpResponse::Accepted().json(SubmissionResponse::Queued {
            seq,
            message: "Story saved offline and will be sent once you are back online".to_string(),
        }),
    };
    Ok(response)
}

#[post("/login")]
pub async fn login(
    page: web::Data<PageContext>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse> {
    page.gateway.authenticate(&body).await?;
    info!("Session token stored");
    Ok(HttpResponse::NoContent().finish())
}

#[get("/bookmarks")]
pub async fn list_bookmarks(page: web::Data<PageContext>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(page.store.bookmarks().get_all().await?))
}

/// Toggle a bookmark for a story known to the local store.
#[post("/bookmarks/{id}")]
pub async fn toggle_bookmark(
    page: web::Data<PageContext>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let id = id.into_inner();
    let bookmarks = page.store.bookmarks();

    let bookmarked = if bookmarks.is_bookmarked(&id).await? {
        bookmarks.delete(&id).await?;
        false
    } else {
        let story = page
            .store
            .stories()
            .get(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("story {id}")))?;
        bookmarks.toggle(&story).await?
    };

    Ok(HttpResponse::Ok().json(BookmarkStatus { id, bookmarked }))
}

#[get("/bookmarks/{id}")]
pub async fn bookmark_status(
    page: web::Data<PageContext>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let id = id.into_inner();
    let bookmarked = page.store.bookmarks().is_bookmarked(&id).await?;
    Ok(HttpResponse::Ok().json(BookmarkStatus { id, bookmarked }))
}

#[get("/storage")]
pub async fn storage_info(page: web::Data<PageContext>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(page.store.storage_info().await?))
}

#[delete("/storage")]
pub async fn clear_storage(page: web::Data<PageContext>) -> Result<HttpResponse> {
    page.store.clear_all().await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/cache")]
pub async fn cache_info(worker: web::Data<WorkerContext>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(worker.interceptor.cache_info().await?))
}

#[post("/sync")]
pub async fn sync_now(page: web::Data<PageContext>) -> Result<HttpResponse> {
    let report = page
        .sync_now()
        .await
        .ok_or_else(|| AppError::Internal("worker is not running".to_string()))?;
    Ok(HttpResponse::Ok().json(report))
}

#[post("/skip-waiting")]
pub async fn skip_waiting(page: web::Data<PageContext>) -> Result<HttpResponse> {
    if !page.skip_waiting().await {
        return Err(AppError::Internal("worker is not running".to_string()));
    }
    Ok(HttpResponse::Accepted().finish())
}

/// Deliver a push payload as a notification.
#[post("/push")]
pub async fn push(worker: web::Data<WorkerContext>, body: web::Bytes) -> HttpResponse {
    let notification = Notification::from_push(&body);
    worker.notifier.notify(notification.clone());
    HttpResponse::Ok().json(notification)
}
