// components/model_downloader/src/types.rs
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_REVISION: &str = "main";

/// How cached hub files are placed into the destination directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    /// Write real files. The directory stays usable when moved or mounted elsewhere.
    #[default]
    Copy,
    /// Link to the blobs in the hub cache (unix only, other platforms copy)
    Symlink,
}

/// Everything needed to fetch one model snapshot into a local directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Repository id on the hub, e.g. `microsoft/VibeVoice-Realtime-0.5B`
    pub model_id: String,

    /// Branch, tag or commit
    pub revision: String,

    /// Absolute destination directory
    pub local_dir: PathBuf,

    /// Access token for gated or private repositories
    pub token: Option<String>,

    pub link_mode: LinkMode,

    /// Let the hub client draw progress bars
    pub progress: bool,
}

impl DownloadRequest {
    pub fn new(model_id: impl Into<String>, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_id: model_id.into(),
            revision: DEFAULT_REVISION.to_string(),
            local_dir: local_dir.into(),
            token: None,
            link_mode: LinkMode::Copy,
            progress: true,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_link_mode(mut self, link_mode: LinkMode) -> Self {
        self.link_mode = link_mode;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

/// Result of a completed snapshot download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub model_id: String,
    pub revision: String,
    pub local_dir: PathBuf,

    /// Every file of the snapshot, relative to `local_dir`
    pub files: Vec<PathBuf>,

    /// Files that were already in place and left untouched
    pub reused: usize,

    /// Bytes written into `local_dir` by copying
    pub bytes_copied: u64,
}

/// Coarse category of a failed download, used to pick the user-facing response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing, invalid or unauthorized credentials
    Authentication,
    Other,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to initialise hub client: {0}")]
    Client(#[source] hf_hub::api::tokio::ApiError),

    #[error("authentication failed for {model_id} (HTTP {status}): {message}")]
    Authentication {
        model_id: String,
        status: u16,
        message: String,
    },

    #[error("failed to list files of {model_id}: {source}")]
    RepoInfo {
        model_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {file} from {model_id}: {source}")]
    Fetch {
        model_id: String,
        file: String,
        #[source]
        source: hf_hub::api::tokio::ApiError,
    },

    #[error("refusing to write repository file outside destination: {0}")]
    UnsafePath(String),

    #[error("io error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported as plain text, for `SnapshotSource` implementations
    /// outside this crate that have no richer error to offer
    #[error("Download failed: {0}")]
    DownloadFailed(String),
}

impl DownloadError {
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        DownloadError::Io {
            operation: operation.into(),
            source,
        }
    }

    pub(crate) fn io_at(operation: &str, path: &Path, source: std::io::Error) -> Self {
        Self::io(format!("{} {}", operation, path.display()), source)
    }

    /// Classify the failure.
    ///
    /// Authentication errors and HTTP failures with a known status are
    /// classified directly. Everything else falls back to looking at the
    /// message, because the text is the only signal those failures carry.
    pub fn kind(&self) -> FailureKind {
        match self {
            DownloadError::Authentication { .. } => FailureKind::Authentication,
            _ if self.http_status().is_some() => FailureKind::Other,
            other if message_indicates_authentication(&other.to_string()) => {
                FailureKind::Authentication
            }
            _ => FailureKind::Other,
        }
    }

    /// HTTP status of the failed hub request, when the hub answered
    pub fn http_status(&self) -> Option<u16> {
        match self {
            DownloadError::Authentication { status, .. } => Some(*status),
            DownloadError::RepoInfo { source, .. } => source.status().map(|s| s.as_u16()),
            DownloadError::Fetch {
                source: hf_hub::api::tokio::ApiError::RequestError(source),
                ..
            } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// True if an error message looks like a rejected or missing credential
pub fn message_indicates_authentication(message: &str) -> bool {
    message.to_lowercase().contains("authentication")
        || message.contains("401")
        || message.contains("403")
}

#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch every file of `request.model_id` at `request.revision` into
    /// `request.local_dir`, creating the directory if needed
    async fn download_snapshot(&self, request: &DownloadRequest) -> Result<Snapshot, DownloadError>;
}
