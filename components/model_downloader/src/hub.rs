// components/model_downloader/src/hub.rs
use std::path::PathBuf;

use async_trait::async_trait;
use hf_hub::api::tokio::{Api, ApiBuilder, ApiError, ApiRepo};
use hf_hub::api::RepoInfo;
use hf_hub::{Repo, RepoType};

use crate::types::{DownloadError, DownloadRequest, Snapshot, SnapshotSource};
use crate::utils::{materialize, validate_repo_path, Placement};

/// Snapshot source backed by the Hugging Face Hub.
///
/// Files go through the regular hub cache (`HF_HOME`), which owns retries and
/// resumption, and are then materialized into the requested directory.
#[derive(Debug, Clone, Default)]
pub struct HfHub {
    cache_dir: Option<PathBuf>,
    endpoint: Option<String>,
}

impl HfHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific cache directory instead of the hub default
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Talk to a mirror or self-hosted hub instead of huggingface.co
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn api(&self, request: &DownloadRequest) -> Result<Api, DownloadError> {
        let mut builder = ApiBuilder::new().with_progress(request.progress);

        // Only override when given, so a token saved by `huggingface-cli login` still applies
        if let Some(token) = &request.token {
            builder = builder.with_token(Some(token.clone()));
        }
        if let Some(cache_dir) = &self.cache_dir {
            builder = builder.with_cache_dir(cache_dir.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            builder = builder.with_endpoint(endpoint.clone());
        }

        builder.build().map_err(DownloadError::Client)
    }

    async fn list_files(
        &self,
        repo: &ApiRepo,
        request: &DownloadRequest,
    ) -> Result<Vec<String>, DownloadError> {
        let model_id = &request.model_id;
        let info = repo
            .info_request()
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| repo_info_error(model_id, e))?
            .json::<RepoInfo>()
            .await
            .map_err(|e| repo_info_error(model_id, e))?;

        tracing::debug!(
            "{}@{} resolved to commit {} with {} files",
            model_id,
            request.revision,
            info.sha,
            info.siblings.len()
        );

        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }
}

#[async_trait]
impl SnapshotSource for HfHub {
    async fn download_snapshot(&self, request: &DownloadRequest) -> Result<Snapshot, DownloadError> {
        let api = self.api(request)?;
        let repo = api.repo(Repo::with_revision(
            request.model_id.clone(),
            RepoType::Model,
            request.revision.clone(),
        ));

        let names = self.list_files(&repo, request).await?;
        let relatives = names
            .iter()
            .map(|name| validate_repo_path(name))
            .collect::<Result<Vec<_>, _>>()?;

        tokio::fs::create_dir_all(&request.local_dir)
            .await
            .map_err(|e| DownloadError::io_at("create directory", &request.local_dir, e))?;

        let mut snapshot = Snapshot {
            model_id: request.model_id.clone(),
            revision: request.revision.clone(),
            local_dir: request.local_dir.clone(),
            files: Vec::with_capacity(names.len()),
            reused: 0,
            bytes_copied: 0,
        };

        for (name, relative) in names.iter().zip(relatives) {
            tracing::debug!("Fetching {}", name);

            let cached = repo
                .get(name)
                .await
                .map_err(|e| fetch_error(&request.model_id, name, e))?;

            let dest = request.local_dir.join(&relative);
            match materialize(&cached, &dest, request.link_mode).await? {
                Placement::Reused => {
                    tracing::debug!("{} already up to date", dest.display());
                    snapshot.reused += 1;
                }
                Placement::Copied(bytes) => snapshot.bytes_copied += bytes,
                Placement::Linked => {}
            }
            snapshot.files.push(relative);
        }

        tracing::info!(
            "Snapshot of {} complete: {} files ({} reused, {} bytes copied) in {}",
            snapshot.model_id,
            snapshot.files.len(),
            snapshot.reused,
            snapshot.bytes_copied,
            snapshot.local_dir.display()
        );

        Ok(snapshot)
    }
}

fn auth_status(error: &reqwest::Error) -> Option<u16> {
    error
        .status()
        .map(|status| status.as_u16())
        .filter(|code| matches!(code, 401 | 403))
}

fn repo_info_error(model_id: &str, source: reqwest::Error) -> DownloadError {
    match auth_status(&source) {
        Some(status) => DownloadError::Authentication {
            model_id: model_id.to_string(),
            status,
            message: source.to_string(),
        },
        None => DownloadError::RepoInfo {
            model_id: model_id.to_string(),
            source,
        },
    }
}

fn fetch_error(model_id: &str, file: &str, source: ApiError) -> DownloadError {
    if let ApiError::RequestError(request_error) = &source {
        if let Some(status) = auth_status(request_error) {
            return DownloadError::Authentication {
                model_id: model_id.to_string(),
                status,
                message: format!("{}: {}", file, source),
            };
        }
    }

    DownloadError::Fetch {
        model_id: model_id.to_string(),
        file: file.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureKind;
    use assert_matches::assert_matches;
    use axum::extract::State;
    use axum::http::{header, HeaderMap, HeaderName, StatusCode, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::Router;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

    /// Minimal stand-in for the hub's info and resolve endpoints
    struct StubHub {
        files: Vec<(&'static str, &'static str)>,
        info_status: StatusCode,
        file_status: StatusCode,
    }

    impl StubHub {
        fn serving(files: &[(&'static str, &'static str)]) -> Self {
            Self {
                files: files.to_vec(),
                info_status: StatusCode::OK,
                file_status: StatusCode::OK,
            }
        }

        fn info_status(mut self, status: StatusCode) -> Self {
            self.info_status = status;
            self
        }

        fn file_status(mut self, status: StatusCode) -> Self {
            self.file_status = status;
            self
        }

        async fn spawn(self) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let app = Router::new().fallback(serve).with_state(Arc::new(self));
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
            format!("http://{}", addr)
        }
    }

    async fn serve(State(hub): State<Arc<StubHub>>, uri: Uri, headers: HeaderMap) -> Response {
        let path = uri.path();

        if path.starts_with("/api/models/") {
            if hub.info_status != StatusCode::OK {
                return hub.info_status.into_response();
            }
            let siblings = hub
                .files
                .iter()
                .map(|(name, _)| format!(r#"{{"rfilename":"{}"}}"#, name))
                .collect::<Vec<_>>()
                .join(",");
            let body = format!(r#"{{"sha":"{}","siblings":[{}]}}"#, COMMIT, siblings);
            return ([(header::CONTENT_TYPE, "application/json")], body).into_response();
        }

        let Some((_, name)) = path.split_once("/resolve/main/") else {
            return StatusCode::NOT_FOUND.into_response();
        };
        if hub.file_status != StatusCode::OK {
            return hub.file_status.into_response();
        }
        let Some((_, contents)) = hub.files.iter().find(|(file, _)| *file == name) else {
            return StatusCode::NOT_FOUND.into_response();
        };

        let (start, end) = requested_range(&headers, contents.len());
        (
            StatusCode::PARTIAL_CONTENT,
            [
                (
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, contents.len()),
                ),
                (header::ETAG, format!("\"etag-{}\"", name.replace('.', "-"))),
                (HeaderName::from_static("x-repo-commit"), COMMIT.to_string()),
            ],
            contents.as_bytes()[start..=end].to_vec(),
        )
            .into_response()
    }

    fn requested_range(headers: &HeaderMap, len: usize) -> (usize, usize) {
        headers
            .get(header::RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("bytes="))
            .and_then(|range| range.split_once('-'))
            .and_then(|(start, end)| Some((start.parse().ok()?, end.parse::<usize>().ok()?)))
            .map(|(start, end)| (start, end.min(len - 1)))
            .unwrap_or((0, len - 1))
    }

    fn hub_at(endpoint: String, cache: &TempDir) -> HfHub {
        HfHub::new().with_endpoint(endpoint).with_cache_dir(cache.path())
    }

    fn request_into(local_dir: &Path) -> DownloadRequest {
        DownloadRequest::new("org/model", local_dir).with_progress(false)
    }

    #[test]
    fn builds_client_with_and_without_token() {
        let cache = TempDir::new().unwrap();
        let hub = HfHub::new().with_cache_dir(cache.path());
        let request = DownloadRequest::new("org/model", "/models/model").with_progress(false);

        assert!(hub.api(&request).is_ok());
        assert!(hub
            .api(&request.with_token(Some("hf_test".to_string())))
            .is_ok());
    }

    #[test]
    fn io_failures_while_fetching_are_not_authentication() {
        let error = fetch_error(
            "org/model",
            "model.safetensors",
            ApiError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )),
        );
        assert_matches!(error, DownloadError::Fetch { ref file, .. } if file == "model.safetensors");
    }

    #[tokio::test]
    async fn downloads_every_file_as_real_copies() {
        let endpoint = StubHub::serving(&[
            ("config.json", "{\"hidden\": 8}"),
            ("model.safetensors", "GOODWEIGHTS"),
        ])
        .spawn()
        .await;
        let cache = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let local_dir = out.path().join("model");
        let hub = hub_at(endpoint, &cache);

        let snapshot = hub.download_snapshot(&request_into(&local_dir)).await.unwrap();

        assert_eq!(
            snapshot.files,
            vec![PathBuf::from("config.json"), PathBuf::from("model.safetensors")]
        );
        assert_eq!(snapshot.reused, 0);
        assert_eq!(snapshot.bytes_copied, 24);
        let weights = local_dir.join("model.safetensors");
        assert!(!fs::symlink_metadata(&weights).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&weights).unwrap(), b"GOODWEIGHTS");
        assert_eq!(fs::read(local_dir.join("config.json")).unwrap(), b"{\"hidden\": 8}");

        let again = hub.download_snapshot(&request_into(&local_dir)).await.unwrap();
        assert_eq!(again.reused, 2);
        assert_eq!(again.bytes_copied, 0);
    }

    #[tokio::test]
    async fn forbidden_listing_is_authentication() {
        let endpoint = StubHub::serving(&[("config.json", "{}")])
            .info_status(StatusCode::FORBIDDEN)
            .spawn()
            .await;
        let cache = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let error = hub_at(endpoint, &cache)
            .download_snapshot(&request_into(out.path()))
            .await
            .unwrap_err();

        assert_matches!(error, DownloadError::Authentication { status: 403, .. });
        assert_eq!(error.kind(), FailureKind::Authentication);
    }

    #[tokio::test]
    async fn unauthorized_file_fetch_is_authentication() {
        let endpoint = StubHub::serving(&[("model.safetensors", "GOODWEIGHTS")])
            .file_status(StatusCode::UNAUTHORIZED)
            .spawn()
            .await;
        let cache = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let error = hub_at(endpoint, &cache)
            .download_snapshot(&request_into(out.path()))
            .await
            .unwrap_err();

        assert_matches!(error, DownloadError::Authentication { status: 401, .. });
        assert_eq!(error.kind(), FailureKind::Authentication);
    }

    #[tokio::test]
    async fn missing_repository_is_not_authentication() {
        let endpoint = StubHub::serving(&[])
            .info_status(StatusCode::NOT_FOUND)
            .spawn()
            .await;
        let cache = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let error = hub_at(endpoint, &cache)
            .download_snapshot(&request_into(out.path()))
            .await
            .unwrap_err();

        assert_matches!(error, DownloadError::RepoInfo { .. });
        assert_eq!(error.http_status(), Some(404));
        assert_eq!(error.kind(), FailureKind::Other);
    }

    #[tokio::test]
    async fn missing_file_is_not_authentication() {
        let endpoint = StubHub::serving(&[("model.safetensors", "GOODWEIGHTS")])
            .file_status(StatusCode::NOT_FOUND)
            .spawn()
            .await;
        let cache = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let error = hub_at(endpoint, &cache)
            .download_snapshot(&request_into(out.path()))
            .await
            .unwrap_err();

        assert_matches!(error, DownloadError::Fetch { ref file, .. } if file == "model.safetensors");
        assert_eq!(error.http_status(), Some(404));
        assert_eq!(error.kind(), FailureKind::Other);
    }

    #[tokio::test]
    async fn unsafe_name_aborts_before_anything_is_written() {
        let endpoint = StubHub::serving(&[
            ("config.json", "{}"),
            ("../escape.bin", "outside"),
        ])
        .spawn()
        .await;
        let cache = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let local_dir = out.path().join("model");

        let error = hub_at(endpoint, &cache)
            .download_snapshot(&request_into(&local_dir))
            .await
            .unwrap_err();

        assert_matches!(error, DownloadError::UnsafePath(ref name) if name == "../escape.bin");
        assert!(!local_dir.exists());
        assert!(!out.path().join("escape.bin").exists());
    }
}
