// bases/download_cli/src/app.rs
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use model_downloader::{has_existing_content, FailureKind, Snapshot, SnapshotSource};
use crate::config::Config;
use crate::output::OutputHandler;
use crate::prompt::{Confirm, REDOWNLOAD_QUESTION};

/// How a run ended, when it didn't end with a propagated error
#[derive(Debug)]
pub enum Outcome {
    Downloaded(Snapshot),
    /// Destination already had content and the operator declined a re-download
    ReusedExisting,
    /// Credentials were missing or rejected; guidance has been printed
    AuthenticationFailed,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Downloaded(_) | Outcome::ReusedExisting => 0,
            Outcome::AuthenticationFailed => 1,
        }
    }
}

pub struct App {
    config: Config,
    output: OutputHandler,
}

impl App {
    pub fn new(config: Config) -> Self {
        let output = OutputHandler::new(config.verbose);
        Self { config, output }
    }

    /// Any failure other than authentication is printed and then returned as-is.
    pub async fn run(
        &self,
        source: &dyn SnapshotSource,
        confirm: &mut dyn Confirm,
    ) -> Result<Outcome> {
        let request = &self.config.request;
        self.output.print_download_start(request);

        let existing = has_existing_content(&request.local_dir)
            .await
            .wrap_err_with(|| format!("failed to inspect {}", request.local_dir.display()))?;
        if existing {
            self.output.print_existing_content(&request.local_dir);

            let redownload = if self.config.assume_yes {
                self.output.print_redownload_assumed();
                true
            } else {
                confirm.confirm(REDOWNLOAD_QUESTION)?
            };

            if !redownload {
                self.output.print_skipped();
                return Ok(Outcome::ReusedExisting);
            }
        }

        tracing::debug!("Requesting snapshot: {:?}", request.model_id);

        match source.download_snapshot(request).await {
            Ok(snapshot) => {
                self.output.print_download_complete(&snapshot);
                Ok(Outcome::Downloaded(snapshot))
            }
            Err(error) => match error.kind() {
                FailureKind::Authentication => {
                    self.output.print_authentication_error(&error);
                    Ok(Outcome::AuthenticationFailed)
                }
                FailureKind::Other => {
                    self.output.print_download_error(&error);
                    Err(error.into())
                }
            },
        }
    }
}
