use std::{io, path::Path};

use axum::{
    Router,
    body::Body,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{Field, MultipartRejection},
    },
    http::header,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::{TimeDelta, Utc};
use glowfit_models::{
    target::{Target, TargetKind},
    video::{Video, VideoId},
};
use glowfit_storage::NewVideo;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use super::ensure_target;
use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    response::{ApiPath, ApiQuery, ApiResponse},
    state::AppState,
    validation::Validator,
};

const MAX_EXPIRY_DAYS: i64 = 365;
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

pub fn router(max_bytes: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/videos", post(upload_video).get(list_videos))
        .route("/videos/{id}", delete(delete_video))
        .route("/videos/{id}/file", get(download_video))
        .layer(DefaultBodyLimit::max(body_limit))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoQuery {
    #[serde(alias = "target_kind")]
    target_kind: TargetKind,
    #[serde(alias = "target_id")]
    target_id: i64,
}

/// A file written to the upload directory whose row does not exist yet.
struct PendingUpload {
    stored_name: String,
    file_name: String,
    content_type: String,
    size_bytes: u64,
}

impl PendingUpload {
    async fn discard(self, upload_dir: &Path) {
        if let Err(e) = tokio::fs::remove_file(upload_dir.join(&self.stored_name)).await {
            log::warn!("Could not remove discarded upload. [file = {}]: {e:?}", self.stored_name);
        }
    }
}

#[derive(Default)]
struct UploadForm {
    target_kind: Option<String>,
    target_id: Option<String>,
    expires_in_days: Option<String>,
    file: Option<PendingUpload>,
}

fn stored_name_for(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    match extension {
        Some(extension) => format!("{}.{extension}", uuid::Uuid::new_v4()),
        None => uuid::Uuid::new_v4().to_string(),
    }
}

/// Streams the file field to disk, giving up as soon as it grows past `max_bytes`.
async fn save_file(
    mut field: Field<'_>,
    upload_dir: &Path,
    max_bytes: u64,
) -> ApiResult<PendingUpload> {
    let content_type = field.content_type().unwrap_or_default().to_string();
    if !content_type.starts_with("video/") {
        return Err(ApiError::field("file", "only video files are allowed"));
    }
    let file_name = field
        .file_name()
        .map(str::to_string)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "video".to_string());

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(anyhow::Error::from)?;
    let stored_name = stored_name_for(&file_name);
    let path = upload_dir.join(&stored_name);
    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(anyhow::Error::from)?;

    let mut pending = PendingUpload {
        stored_name,
        file_name,
        content_type,
        size_bytes: 0,
    };

    let result: ApiResult<()> = async {
        while let Some(chunk) = field.chunk().await? {
            pending.size_bytes += chunk.len() as u64;
            if pending.size_bytes > max_bytes {
                return Err(ApiError::field(
                    "file",
                    format!("must be at most {max_bytes} bytes"),
                ));
            }
            file.write_all(&chunk).await.map_err(anyhow::Error::from)?;
        }
        file.flush().await.map_err(anyhow::Error::from)?;
        Ok(())
    }
    .await;

    match result {
        Ok(()) if pending.size_bytes == 0 => {
            pending.discard(upload_dir).await;
            Err(ApiError::field("file", "must not be empty"))
        }
        Ok(()) => Ok(pending),
        Err(e) => {
            pending.discard(upload_dir).await;
            Err(e)
        }
    }
}

async fn read_form(mut multipart: Multipart, state: &AppState) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    if let Err(e) = read_fields(&mut multipart, state, &mut form).await {
        if let Some(file) = form.file.take() {
            file.discard(&state.uploads.dir).await;
        }
        return Err(e);
    }

    Ok(form)
}

async fn read_fields(
    multipart: &mut Multipart,
    state: &AppState,
    form: &mut UploadForm,
) -> ApiResult<()> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" if form.file.is_none() => {
                let upload = save_file(field, &state.uploads.dir, state.uploads.max_bytes).await?;
                form.file = Some(upload);
            }
            "targetKind" | "target_kind" => form.target_kind = Some(field.text().await?),
            "targetId" | "target_id" => form.target_id = Some(field.text().await?),
            "expiresInDays" | "expires_in_days" => {
                form.expires_in_days = Some(field.text().await?)
            }
            _ => {}
        }
    }

    Ok(())
}

async fn upload_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<Video>> {
    let UploadForm {
        target_kind,
        target_id,
        expires_in_days,
        file,
    } = read_form(multipart?, &state).await?;

    let target_kind = target_kind.as_deref().map(|kind| kind.trim().parse::<TargetKind>());
    let target_id = target_id.as_deref().map(|id| id.trim().parse::<i64>());
    let expires_in_days = expires_in_days
        .as_deref()
        .filter(|days| !days.trim().is_empty())
        .map(|days| days.trim().parse::<i64>());

    let validation = Validator::new()
        .check(file.is_some(), "file", "is required")
        .check(
            matches!(target_kind, Some(Ok(_))),
            "targetKind",
            "must be skincare or fitness",
        )
        .check(matches!(target_id, Some(Ok(_))), "targetId", "must be a number")
        .check(
            expires_in_days
                .as_ref()
                .is_none_or(|days| days.as_ref().is_ok_and(|d| (1..=MAX_EXPIRY_DAYS).contains(d))),
            "expiresInDays",
            "must be between 1 and 365",
        )
        .finish();

    let Some(file) = file else {
        return Err(validation
            .err()
            .unwrap_or_else(|| ApiError::field("file", "is required")));
    };
    let target = match (validation, target_kind, target_id) {
        (Ok(()), Some(Ok(kind)), Some(Ok(id))) => Target { kind, id },
        (validation, _, _) => {
            file.discard(&state.uploads.dir).await;
            return Err(validation
                .err()
                .unwrap_or_else(|| ApiError::field("targetId", "is required")));
        }
    };
    if let Err(e) = ensure_target(&state, user.id, target).await {
        file.discard(&state.uploads.dir).await;
        return Err(e);
    }

    let expires_at = expires_in_days
        .and_then(Result::ok)
        .map(|days| Utc::now() + TimeDelta::days(days));
    let inserted = state
        .videos
        .insert(NewVideo {
            user_id: user.id,
            target,
            file_name: file.file_name.clone(),
            stored_name: file.stored_name.clone(),
            content_type: file.content_type.clone(),
            size_bytes: file.size_bytes,
            expires_at,
        })
        .await;

    match inserted {
        Ok(video) => {
            log::info!(
                "Video uploaded. [video_id = {}, size_bytes = {}]",
                video.id,
                video.size_bytes
            );
            Ok(ApiResponse::created(video))
        }
        Err(e) => {
            file.discard(&state.uploads.dir).await;
            Err(e.into())
        }
    }
}

async fn list_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<VideoQuery>,
) -> ApiResult<ApiResponse<Vec<Video>>> {
    let target = Target {
        kind: query.target_kind,
        id: query.target_id,
    };
    let now = Utc::now();
    let videos = state
        .videos
        .list_for_target(user.id, target)
        .await?
        .into_iter()
        .filter(|video| !video.is_expired(now))
        .collect();

    Ok(ApiResponse::ok(videos))
}

async fn download_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<VideoId>,
) -> ApiResult<impl IntoResponse> {
    let video = state
        .videos
        .get(user.id, id)
        .await?
        .filter(|video| !video.is_expired(Utc::now()))
        .ok_or(ApiError::NotFound("Video"))?;

    let file = match tokio::fs::File::open(state.uploads.dir.join(&video.stored_name)).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Video file"));
        }
        Err(e) => return Err(anyhow::Error::from(e).into()),
    };

    let length = file.metadata().await.map_err(anyhow::Error::from)?.len();

    let disposition = format!(
        "inline; filename=\"{}\"",
        video.file_name.replace(['"', '\\', '\r', '\n'], "_")
    );
    Ok((
        [
            (header::CONTENT_TYPE, video.content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, length.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    ))
}

async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<VideoId>,
) -> ApiResult<ApiResponse<()>> {
    let video = state
        .videos
        .delete(user.id, id)
        .await?
        .ok_or(ApiError::NotFound("Video"))?;

    match tokio::fs::remove_file(state.uploads.dir.join(&video.stored_name)).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            log::warn!("Could not remove video file, leaving it to the janitor. [video_id = {id}]: {e:?}");
        }
        _ => {}
    }

    Ok(ApiResponse::message("Video deleted"))
}
