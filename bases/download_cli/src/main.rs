// bases/download_cli/src/main.rs
mod app;
mod args;
mod config;
mod output;
mod prompt;

use app::{App, Outcome};
use args::Args;
use clap::Parser;
use color_eyre::Result;
use config::Config;
use model_downloader::HfHub;
use prompt::StdinConfirm;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::from_env(args)?;
    let app = App::new(config);

    let outcome = app.run(&HfHub::new(), &mut StdinConfirm).await?;
    match &outcome {
        Outcome::Downloaded(snapshot) => {
            tracing::debug!("{} files in {}", snapshot.files.len(), snapshot.local_dir.display());
        }
        Outcome::ReusedExisting => {}
        Outcome::AuthenticationFailed => std::process::exit(outcome.exit_code()),
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "download_model=debug,model_downloader=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
