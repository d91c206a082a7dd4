use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::{
    error::{AppError, AppResult, FsError},
    metrics::Metrics,
    scanner::{normalize_prefix, ContentCache, FilesystemObject},
};

pub const CHECKSUM_HEADER: HeaderName = HeaderName::from_static("x-mediaserver-checksum");

/// Serves and deletes files below one disk root under one URL prefix.
pub struct DownloadHandler {
    disk_root: PathBuf,
    serve_prefix: String,
    cache: Arc<ContentCache>,
    metrics: Metrics,
}

impl DownloadHandler {
    pub fn new(
        disk_root: impl Into<PathBuf>,
        serve_prefix: &str,
        cache: Arc<ContentCache>,
        metrics: Metrics,
    ) -> Self {
        let disk_root = disk_root.into();
        let serve_prefix = normalize_prefix(serve_prefix);
        tracing::info!(serve_path = %serve_prefix, disk_path = %disk_root.display(), "starting download handler");
        Self { disk_root, serve_prefix, cache, metrics }
    }

    pub fn serve_prefix(&self) -> &str {
        &self.serve_prefix
    }

    /// Map a decoded request path onto the disk root.
    pub fn resolve(&self, request_path: &str) -> AppResult<PathBuf> {
        if contains_dot_dot(request_path) {
            return Err(AppError::BadRequest("invalid path".into()));
        }
        let rest = request_path.strip_prefix(self.serve_prefix.as_str()).unwrap_or(request_path);
        Ok(self.disk_root.join(rest.trim_start_matches(['/', '\\'])))
    }

    async fn handle(&self, req: Request) -> AppResult<Response> {
        let method = req.method().clone();
        tracing::info!(path = %req.uri().path(), method = %method, "received HTTP request");

        if !matches!(method, Method::GET | Method::HEAD | Method::DELETE) {
            return Err(AppError::MethodNotAllowed);
        }

        let decoded = urlencoding::decode(req.uri().path())
            .map_err(|_| AppError::BadRequest("invalid path".into()))?
            .into_owned();
        let disk_path = self.resolve(&decoded)?;

        let info = tokio::fs::metadata(&disk_path).await.map_err(|e| {
            tracing::error!(path = %disk_path.display(), error = %e, "couldn't serve file");
            FsError::io("stat", &disk_path, e)
        })?;
        if info.is_dir() || !info.is_file() {
            tracing::error!(path = %disk_path.display(), "non-files not supported");
            return Err(FsError::NotRegularFile(disk_path).into());
        }

        if method == Method::DELETE {
            self.delete(&disk_path).await
        } else {
            self.download(disk_path, req).await
        }
    }

    async fn download(&self, disk_path: PathBuf, req: Request) -> AppResult<Response> {
        let checksum = self.checksum(&disk_path).await?;
        tracing::info!(path = %disk_path.display(), "serving file");

        let res = match ServeFile::new(&disk_path).oneshot(req).await {
            Ok(res) => res,
            Err(never) => match never {},
        };
        let mut res = res.map(Body::new);
        let value = HeaderValue::from_str(&checksum)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid checksum header: {}", e)))?;
        res.headers_mut().insert(CHECKSUM_HEADER, value);
        self.metrics.inc_files_served();
        Ok(res)
    }

    /// Digest of the file, from the cache when the cached node is still fresh.
    async fn checksum(&self, disk_path: &Path) -> AppResult<String> {
        let cache = self.cache.clone();
        let path = disk_path.to_path_buf();
        let node = tokio::task::spawn_blocking(move || -> Result<_, FsError> {
            let node = FilesystemObject::from_path_cached(&path, &cache)?;
            let cached = cache.get(&path).is_some_and(|c| Arc::ptr_eq(&c, &node));
            if !cached {
                cache.put(node.clone());
            }
            Ok(node)
        })
        .await??;
        node.hash.clone().ok_or_else(|| FsError::NotRegularFile(disk_path.to_path_buf()).into())
    }

    async fn delete(&self, disk_path: &Path) -> AppResult<Response> {
        tracing::info!(path = %disk_path.display(), "deleting file");
        if let Err(e) = tokio::fs::remove_file(disk_path).await {
            tracing::error!(path = %disk_path.display(), error = %e, "failed to delete file");
            return Err(AppError::IoError(format!("{}: {}", e.kind(), e)));
        }
        self.cache.remove(disk_path);
        self.metrics.inc_files_deleted();
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

pub async fn serve(State(handler): State<Arc<DownloadHandler>>, req: Request) -> AppResult<Response> {
    handler.handle(req).await
}

/// True when a `..` appears as a whole path segment (split on `/` and `\`).
pub fn contains_dot_dot(path: &str) -> bool {
    if !path.contains("..") {
        return false;
    }
    path.split(['/', '\\']).any(|segment| segment == "..")
}
