use std::process::ExitCode;

use minimap::run_viewer;
use tracing::{error, info};

use super::bootstrap::{AppWiring, RunMode};
use super::headless::run_headless;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring { mode, mut session } = app;
    match mode {
        RunMode::Window(config) => {
            if let Err(err) = run_viewer(config, session) {
                error!(error = %err, "viewer_failed");
                return ExitCode::FAILURE;
            }
        }
        RunMode::Headless { ticks, out_dir } => {
            match run_headless(&mut session, ticks, &out_dir) {
                Ok(summary) => {
                    info!(
                        ticks = summary.ticks,
                        frames = summary.frames.len(),
                        fingerprint = summary.final_fingerprint.as_deref().unwrap_or("none"),
                        out_dir = %out_dir.display(),
                        "headless_complete"
                    );
                }
                Err(err) => {
                    error!(error = %err, "headless_failed");
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}
