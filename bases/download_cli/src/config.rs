// bases/download_cli/src/config.rs
use crate::args::Args;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use model_downloader::{DownloadRequest, LinkMode};
use std::path::{Component, Path, PathBuf};

/// Primary environment variable holding a hub token
pub const TOKEN_ENV: &str = "HF_TOKEN";

/// Older name for the same token, still honoured
pub const TOKEN_ENV_ALIAS: &str = "HUGGING_FACE_HUB_TOKEN";

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub request: DownloadRequest,

    /// Treat the re-download prompt as answered with yes
    pub assume_yes: bool,

    pub verbose: bool,
}

impl Config {
    /// Resolve against the real process environment and working directory
    pub fn from_env(args: Args) -> Result<Self> {
        let cwd = std::env::current_dir().wrap_err("failed to read current directory")?;
        Ok(Self::resolve(args, |key| std::env::var(key).ok(), &cwd))
    }

    /// Resolve arguments with an explicit environment lookup and working directory
    pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>, cwd: &Path) -> Self {
        let token = resolve_token(args.token, env);
        let local_dir = resolve_local_dir(&args.local_dir, cwd);

        let request = DownloadRequest::new(args.model_id, local_dir)
            .with_revision(args.revision)
            .with_token(token)
            .with_link_mode(LinkMode::Copy)
            .with_progress(!args.no_progress);

        Self {
            request,
            assume_yes: args.yes,
            verbose: args.verbose,
        }
    }
}

/// Pick the token: explicit value, then `HF_TOKEN`, then `HUGGING_FACE_HUB_TOKEN`.
/// Empty values count as unset.
pub fn resolve_token(
    explicit: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let present = |value: &String| !value.is_empty();

    explicit
        .filter(present)
        .or_else(|| env(TOKEN_ENV).filter(present))
        .or_else(|| env(TOKEN_ENV_ALIAS).filter(present))
}

/// Make `path` absolute relative to `cwd` and drop `.`/`..` components.
/// Existing paths are canonicalized so symlinked directories resolve to their target.
pub fn resolve_local_dir(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let normalized = normalize(&joined);

    dunce::canonicalize(&normalized).unwrap_or(normalized)
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
