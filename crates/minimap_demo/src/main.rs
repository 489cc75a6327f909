mod app;

use std::process::ExitCode;

use tracing::error;

use app::args::{parse_args, usage_text, RunRequest, SCENARIO_ENV_VAR};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args, std::env::var(SCENARIO_ENV_VAR).ok()) {
        Ok(RunRequest::Help) => {
            println!("{}", usage_text());
            return ExitCode::SUCCESS;
        }
        Ok(RunRequest::Run(options)) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    app::bootstrap::init_tracing();
    match app::bootstrap::build_app(options) {
        Ok(app) => app::loop_runner::run(app),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
