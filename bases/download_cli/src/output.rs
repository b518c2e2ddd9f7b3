// bases/download_cli/src/output.rs
use model_downloader::{DownloadError, DownloadRequest, Snapshot, DEFAULT_REVISION};
use std::error::Error;
use std::path::Path;

/// Ways to supply a credential, printed after an authentication failure
pub const AUTH_REMEDIATION: [&str; 3] = [
    "Log in to Hugging Face: huggingface-cli login",
    "Or set HF_TOKEN environment variable",
    "Or pass --token <your_token>",
];

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_download_start(&self, request: &DownloadRequest) {
        println!("📥 Downloading model: {}", request.model_id);
        if request.revision != DEFAULT_REVISION {
            println!("🔖 Revision: {}", request.revision);
        }
        println!("📁 Destination: {}", request.local_dir.display());
    }

    pub fn print_existing_content(&self, local_dir: &Path) {
        println!(
            "⚠️  Directory {} already exists and is not empty.",
            local_dir.display()
        );
    }

    pub fn print_redownload_assumed(&self) {
        println!("⚠️  Re-downloading without asking (--yes)");
    }

    pub fn print_skipped(&self) {
        println!("✅ Skipping download (using existing model)");
    }

    pub fn print_download_complete(&self, snapshot: &Snapshot) {
        println!("✅ Downloaded model: {}", snapshot.model_id);
        println!("✅ Model saved to: {}", snapshot.local_dir.display());

        if self.verbose {
            println!(
                "Files: {} ({} already present, {} bytes copied)",
                snapshot.files.len(),
                snapshot.reused,
                snapshot.bytes_copied
            );
        }
    }

    pub fn print_authentication_error(&self, error: &DownloadError) {
        eprintln!("❌ Authentication error: {}", error);
        eprintln!("\n💡 To download gated models, you need to:");
        for (i, remedy) in AUTH_REMEDIATION.iter().enumerate() {
            eprintln!("   {}. {}", i + 1, remedy);
        }
    }

    pub fn print_download_error(&self, error: &DownloadError) {
        eprintln!("❌ Error downloading model: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            let mut cause = error.source();
            while let Some(inner) = cause {
                eprintln!("  caused by: {}", inner);
                cause = inner.source();
            }
        }
    }
}
