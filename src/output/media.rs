// src/output/media.rs
//! Materializes remote media locally and rewrites references to it.

use crate::constants::{DEFAULT_MEDIA_BASENAME, DEFAULT_MEDIA_EXTENSION};
use crate::error::AppError;
use crate::model::MediaRef;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Status and body of a media GET.
#[derive(Debug, Clone)]
pub struct MediaResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl MediaResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Generic HTTP GET used only for media download.
#[async_trait::async_trait]
pub trait MediaTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<MediaResponse, AppError>;
}

#[async_trait::async_trait]
impl MediaTransport for reqwest::Client {
    async fn get(&self, url: &Url) -> Result<MediaResponse, AppError> {
        let response = reqwest::Client::get(self, url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(MediaResponse { status, body })
    }
}

#[derive(Clone)]
pub struct MediaLocalizer {
    directory: PathBuf,
    url_prefix: String,
    working_root: PathBuf,
    transport: Arc<dyn MediaTransport>,
}

impl MediaLocalizer {
    /// Files land in `directory`; an empty `url_prefix` yields paths
    /// relative to the current working directory instead.
    pub fn new(
        directory: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
        transport: Arc<dyn MediaTransport>,
    ) -> Self {
        Self {
            directory: directory.into(),
            url_prefix: url_prefix.into(),
            working_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            transport,
        }
    }

    /// Overrides the root that unprefixed document paths are relative to.
    pub fn with_working_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.working_root = root.into();
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// A localizer writing under `directory/<scope>` and referencing
    /// media as `<prefix>/<scope>/<file>`.
    ///
    /// Indices restart at 0 for every document, so documents sharing one
    /// media directory each need their own scope.
    pub fn scoped(&self, scope: &str) -> Self {
        let url_prefix = if self.url_prefix.is_empty() {
            String::new()
        } else {
            format!("{}/{}", self.url_prefix.trim_end_matches('/'), scope)
        };
        Self {
            directory: self.directory.join(scope),
            url_prefix,
            working_root: self.working_root.clone(),
            transport: self.transport.clone(),
        }
    }

    /// Parses `url` and requires an http(s) scheme.
    pub fn validate(&self, url: &str) -> Result<Url, AppError> {
        let parsed = Url::parse(url).map_err(|e| AppError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(AppError::InvalidProtocol {
                url: url.to_string(),
                scheme: other.to_string(),
            }),
        }
    }

    /// `{basename}_{index}{extension}` from the URL's last path segment.
    pub fn filename(&self, url: &Url, index: usize) -> String {
        let segment = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_MEDIA_BASENAME);

        let path = Path::new(segment);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| format!(".{}", e))
            .unwrap_or_else(|| DEFAULT_MEDIA_EXTENSION.to_string());
        let basename = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_MEDIA_BASENAME);

        format!("{}_{}{}", basename, index, extension)
    }

    /// Downloads `url` into the media directory as `filename`.
    pub async fn download(&self, url: &str, filename: &str) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| AppError::DirectoryCreate {
                path: self.directory.clone(),
                source,
            })?;

        let parsed = self.validate(url)?;
        let response = self
            .transport
            .get(&parsed)
            .await
            .map_err(|e| AppError::Download {
                url: url.to_string(),
                reason: "request failed".to_string(),
                status: None,
                source: Some(Box::new(e)),
            })?;

        if !response.is_success() {
            return Err(AppError::Download {
                url: url.to_string(),
                reason: format!("unexpected status {}", response.status),
                status: Some(response.status),
                source: None,
            });
        }

        let local_path = self.directory.join(filename);
        tokio::fs::write(&local_path, &response.body)
            .await
            .map_err(|e| AppError::Download {
                url: url.to_string(),
                reason: format!("could not write {}", local_path.display()),
                status: None,
                source: Some(Box::new(AppError::Io(e))),
            })?;

        log::debug!(
            "Downloaded {} ({} bytes) to {}",
            url,
            response.body.len(),
            local_path.display()
        );
        Ok(local_path)
    }

    /// Path a document should use to reference `local_path`.
    pub fn to_document_path(&self, local_path: &Path) -> String {
        let basename = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !self.url_prefix.is_empty() {
            return format!("{}/{}", self.url_prefix.trim_end_matches('/'), basename);
        }

        let absolute = self.working_root.join(local_path);
        pathdiff::diff_paths(&absolute, &self.working_root)
            .unwrap_or_else(|| local_path.to_path_buf())
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Validates, names, downloads and maps one media reference.
    pub async fn localize(&self, url: &str, index: usize) -> Result<MediaRef, AppError> {
        let parsed = self.validate(url)?;
        let filename = self.filename(&parsed, index);
        let local_path = self.download(url, &filename).await?;
        let document_path = self.to_document_path(&local_path);
        Ok(MediaRef {
            original_url: url.to_string(),
            local_path,
            document_path,
        })
    }
}
