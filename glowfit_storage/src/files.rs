use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use glowfit_models::video::{Video, VideoId};
use serde::Serialize;
use walkdir::WalkDir;

use crate::{StorageResult, video::VideoStorage};

/// A file in the upload directory that no video row points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedFile {
    /// Path relative to the upload directory.
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub dry_run: bool,
    pub orphaned_files: Vec<OrphanedFile>,
    pub expired_videos: Vec<VideoId>,
    pub dangling_videos: Vec<VideoId>,
    pub freed_bytes: u64,
}

/// Keeps the upload directory and the `videos` table in agreement.
pub struct FileJanitor {
    videos: Arc<dyn VideoStorage>,
    upload_dir: PathBuf,
}

impl FileJanitor {
    pub fn new(videos: Arc<dyn VideoStorage>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            videos,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn find_orphaned_files(&self) -> StorageResult<Vec<OrphanedFile>> {
        let known: HashSet<String> = self
            .videos
            .list_all()
            .await?
            .into_iter()
            .map(|video| video.stored_name)
            .collect();

        let upload_dir = self.upload_dir.clone();
        let files = tokio::task::spawn_blocking(move || walk_files(&upload_dir))
            .await
            .map_err(io::Error::other)??;

        Ok(files
            .into_iter()
            .filter(|file| !known.contains(&file.name))
            .collect())
    }

    pub async fn find_expired_videos(&self, now: DateTime<Utc>) -> StorageResult<Vec<Video>> {
        self.videos.list_expired(now).await
    }

    pub async fn find_dangling_videos(&self) -> StorageResult<Vec<Video>> {
        let mut dangling = Vec::new();
        for video in self.videos.list_all().await? {
            if !tokio::fs::try_exists(self.upload_dir.join(&video.stored_name)).await? {
                dangling.push(video);
            }
        }

        Ok(dangling)
    }

    /// Removes orphaned files, expired videos (file and row) and rows whose
    /// file is gone. With `dry_run` nothing is touched and the report lists
    /// what would have been removed.
    pub async fn cleanup(&self, now: DateTime<Utc>, dry_run: bool) -> StorageResult<CleanupReport> {
        let mut report = CleanupReport {
            dry_run,
            ..Default::default()
        };

        for file in self.find_orphaned_files().await? {
            if !dry_run {
                if let Err(e) = self.remove_file(&file.name).await {
                    log::warn!("Could not remove orphaned file. [file = {}]: {e:?}", file.name);
                    continue;
                }
            }
            report.freed_bytes += file.size_bytes;
            report.orphaned_files.push(file);
        }

        for video in self.find_expired_videos(now).await? {
            if !dry_run {
                if let Err(e) = self.remove_file(&video.stored_name).await {
                    log::warn!("Could not remove expired video file. [video_id = {}]: {e:?}", video.id);
                    continue;
                }
                self.videos.delete_by_id(video.id).await?;
            }
            report.freed_bytes += video.size_bytes;
            report.expired_videos.push(video.id);
        }

        for video in self.find_dangling_videos().await? {
            if report.expired_videos.contains(&video.id) {
                continue;
            }
            if !dry_run {
                self.videos.delete_by_id(video.id).await?;
            }
            report.dangling_videos.push(video.id);
        }

        log::info!(
            "File cleanup finished. [dry_run = {dry_run}, orphaned = {}, expired = {}, dangling = {}, freed_bytes = {}]",
            report.orphaned_files.len(),
            report.expired_videos.len(),
            report.dangling_videos.len(),
            report.freed_bytes
        );

        Ok(report)
    }

    /// A file that is already gone counts as removed.
    async fn remove_file(&self, name: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.upload_dir.join(name)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

fn walk_files(upload_dir: &Path) -> io::Result<Vec<OrphanedFile>> {
    if !upload_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(upload_dir).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(upload_dir) else {
            continue;
        };
        files.push(OrphanedFile {
            name: relative.to_string_lossy().replace('\\', "/"),
            size_bytes: entry.metadata()?.len(),
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(files)
}
