// components/model_downloader/src/lib.rs
//! Snapshot downloads of Hugging Face Hub models into plain directories.
//!
//! [`HfHub`] fetches every file of a model repository at a revision through the
//! hub cache and places the files under a destination directory, either as
//! real copies (the default, portable onto volumes and containers) or as
//! symlinks into the cache.
//!
//! Callers depend on the [`SnapshotSource`] trait so the transfer can be
//! swapped out, e.g. in tests.
mod hub;
mod types;
mod utils;

pub use hub::HfHub;
pub use types::{
    message_indicates_authentication, DownloadError, DownloadRequest, FailureKind, LinkMode,
    Snapshot, SnapshotSource, DEFAULT_REVISION,
};
pub use utils::has_existing_content;
