// components/model_downloader/src/utils.rs
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

use tokio::io::AsyncReadExt;

use crate::types::{DownloadError, LinkMode};

const COMPARE_CHUNK: usize = 64 * 1024;

/// What happened to a single file while materializing a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Destination already held an equivalent file
    Reused,
    /// Copied this many bytes
    Copied(u64),
    Linked,
}

/// True if `path` is a directory with at least one entry.
///
/// A missing path, or one that is not a directory, has no content. Any other
/// failure to inspect or list it is returned.
pub async fn has_existing_content(path: &Path) -> io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Ok(false),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            return Ok(false)
        }
        Err(e) => return Err(e),
    }

    let mut entries = tokio::fs::read_dir(path).await?;
    Ok(entries.next_entry().await?.is_some())
}

/// Turn a repository file name into a relative path that cannot escape the destination
pub fn validate_repo_path(name: &str) -> Result<PathBuf, DownloadError> {
    let path = Path::new(name);
    let safe = !name.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

    if safe {
        Ok(path.to_path_buf())
    } else {
        Err(DownloadError::UnsafePath(name.to_string()))
    }
}

/// Place a file from the hub cache at `dest`
pub async fn materialize(
    cached: &Path,
    dest: &Path,
    mode: LinkMode,
) -> Result<Placement, DownloadError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io_at("create directory", parent, e))?;
    }

    // Cache entries are usually symlinks into the blob store; resolve to the blob
    let source = dunce::canonicalize(cached)
        .map_err(|e| DownloadError::io_at("resolve cached file", cached, e))?;
    let source_len = tokio::fs::metadata(&source)
        .await
        .map_err(|e| DownloadError::io_at("read metadata of", &source, e))?
        .len();

    match tokio::fs::symlink_metadata(dest).await {
        Ok(existing) => {
            if is_equivalent(&existing, dest, &source, source_len, mode).await {
                return Ok(Placement::Reused);
            }
            if existing.is_dir() {
                return Err(DownloadError::io_at(
                    "replace",
                    dest,
                    std::io::Error::new(ErrorKind::AlreadyExists, "a directory is in the way"),
                ));
            }
            tokio::fs::remove_file(dest)
                .await
                .map_err(|e| DownloadError::io_at("remove stale", dest, e))?;
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(DownloadError::io_at("inspect", dest, e)),
    }

    match mode {
        LinkMode::Copy => copy(&source, dest).await,
        LinkMode::Symlink => link(&source, dest).await,
    }
}

async fn is_equivalent(
    existing: &std::fs::Metadata,
    dest: &Path,
    source: &Path,
    source_len: u64,
    mode: LinkMode,
) -> bool {
    match mode {
        LinkMode::Copy => {
            existing.is_file()
                && existing.len() == source_len
                && same_contents(source, dest).await.unwrap_or(false)
        }
        LinkMode::Symlink => {
            existing.file_type().is_symlink()
                && tokio::fs::read_link(dest)
                    .await
                    .map(|target| target == source)
                    .unwrap_or(false)
        }
    }
}

/// Byte-compare two files of equal length
async fn same_contents(left: &Path, right: &Path) -> io::Result<bool> {
    let mut left = tokio::fs::File::open(left).await?;
    let mut right = tokio::fs::File::open(right).await?;
    let mut left_buf = vec![0u8; COMPARE_CHUNK];
    let mut right_buf = vec![0u8; COMPARE_CHUNK];

    loop {
        let read = left.read(&mut left_buf).await?;
        if read == 0 {
            return Ok(right.read(&mut right_buf[..1]).await? == 0);
        }
        right.read_exact(&mut right_buf[..read]).await?;
        if left_buf[..read] != right_buf[..read] {
            return Ok(false);
        }
    }
}

async fn copy(source: &Path, dest: &Path) -> Result<Placement, DownloadError> {
    let bytes = tokio::fs::copy(source, dest)
        .await
        .map_err(|e| DownloadError::io_at("copy to", dest, e))?;
    Ok(Placement::Copied(bytes))
}

#[cfg(unix)]
async fn link(source: &Path, dest: &Path) -> Result<Placement, DownloadError> {
    tokio::fs::symlink(source, dest)
        .await
        .map_err(|e| DownloadError::io_at("symlink", dest, e))?;
    Ok(Placement::Linked)
}

#[cfg(not(unix))]
async fn link(source: &Path, dest: &Path) -> Result<Placement, DownloadError> {
    copy(source, dest).await
}
