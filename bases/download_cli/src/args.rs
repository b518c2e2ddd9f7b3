// bases/download_cli/src/args.rs
use clap::Parser;
use model_downloader::DEFAULT_REVISION;
use std::path::PathBuf;

pub const DEFAULT_MODEL_ID: &str = "microsoft/VibeVoice-Realtime-0.5B";
pub const DEFAULT_LOCAL_DIR: &str = "models/VibeVoice-Realtime-0.5B";

/// Download a pretrained model from the Hugging Face Hub
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Hugging Face model ID
    #[arg(long, default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Local directory to save the model
    #[arg(long, default_value = DEFAULT_LOCAL_DIR)]
    pub local_dir: PathBuf,

    /// Hugging Face token (or set HF_TOKEN). Required if the model is gated.
    #[arg(long)]
    pub token: Option<String>,

    /// Branch, tag or commit to download
    #[arg(long, default_value = DEFAULT_REVISION)]
    pub revision: String,

    /// Re-download without asking when the directory already has content
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Don't draw download progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn no_flags_gives_defaults() {
        let args = Args::try_parse_from(["download-model"]).unwrap();
        assert_eq!(args.model_id, DEFAULT_MODEL_ID);
        assert_eq!(args.local_dir, PathBuf::from(DEFAULT_LOCAL_DIR));
        assert_eq!(args.revision, "main");
        assert!(args.token.is_none());
        assert!(!args.yes);
        assert!(!args.no_progress);
        assert!(!args.verbose);
    }

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "download-model",
            "--model-id",
            "org/tiny",
            "--local-dir",
            "/data/tiny",
            "--token",
            "hf_secret",
            "--revision",
            "v2",
            "-y",
            "--no-progress",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.model_id, "org/tiny");
        assert_eq!(args.local_dir, PathBuf::from("/data/tiny"));
        assert_eq!(args.token.as_deref(), Some("hf_secret"));
        assert_eq!(args.revision, "v2");
        assert!(args.yes);
        assert!(args.no_progress);
        assert!(args.verbose);
    }
}
