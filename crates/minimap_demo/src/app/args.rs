use std::path::PathBuf;

pub(crate) const SCENARIO_ENV_VAR: &str = "MINIMAP_SCENARIO";
const DEFAULT_OUT_DIR: &str = "minimap_frames";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunRequest {
    Help,
    Run(DemoOptions),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DemoOptions {
    pub(crate) scenario: Option<PathBuf>,
    pub(crate) config: Option<PathBuf>,
    pub(crate) headless_ticks: Option<u32>,
    pub(crate) out_dir: PathBuf,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            scenario: None,
            config: None,
            headless_ticks: None,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
        }
    }
}

/// Parses command-line arguments. `scenario_env` is the value of
/// `MINIMAP_SCENARIO`, used when `--scenario` is absent.
pub(crate) fn parse_args(args: &[String], scenario_env: Option<String>) -> Result<RunRequest, String> {
    let mut options = DemoOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(RunRequest::Help),
            "--scenario" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --scenario".to_string())?;
                options.scenario = Some(PathBuf::from(value));
                index += 2;
            }
            "--config" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --config".to_string())?;
                options.config = Some(PathBuf::from(value));
                index += 2;
            }
            "--headless" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --headless".to_string())?;
                let ticks = value
                    .parse::<u32>()
                    .map_err(|_| format!("invalid --headless value '{value}' (expected u32)"))?;
                options.headless_ticks = Some(ticks);
                index += 2;
            }
            "--out" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --out".to_string())?;
                options.out_dir = PathBuf::from(value);
                index += 2;
            }
            other => return Err(format!("unknown argument '{other}'\n\n{}", usage_text())),
        }
    }

    if options.scenario.is_none() {
        options.scenario = scenario_env
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
    }
    Ok(RunRequest::Run(options))
}

pub(crate) fn usage_text() -> String {
    [
        "Usage: minimap_demo [options]",
        "",
        "Options:",
        "  --scenario <path>   scenario JSON (default: built-in world, or $MINIMAP_SCENARIO)",
        "  --config <path>     minimap config JSON, overrides the scenario's minimap block",
        "  --headless <ticks>  run without a window and write a PNG per refresh",
        "  --out <dir>         output directory for headless frames (default: minimap_frames)",
        "  -h, --help          print this help",
        "",
        "Environment: MINIMAP_SCALE, MINIMAP_REFRESH_MS, RUST_LOG",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_arguments_run_builtin_windowed() {
        let request = parse_args(&[], None).expect("parse");
        assert_eq!(request, RunRequest::Run(DemoOptions::default()));
    }

    #[test]
    fn all_options_are_parsed() {
        let request = parse_args(
            &args(&[
                "--scenario",
                "world.json",
                "--config",
                "minimap.json",
                "--headless",
                "120",
                "--out",
                "frames",
            ]),
            None,
        )
        .expect("parse");

        assert_eq!(
            request,
            RunRequest::Run(DemoOptions {
                scenario: Some(PathBuf::from("world.json")),
                config: Some(PathBuf::from("minimap.json")),
                headless_ticks: Some(120),
                out_dir: PathBuf::from("frames"),
            })
        );
    }

    #[test]
    fn scenario_env_is_used_only_without_flag() {
        let from_env = parse_args(&[], Some("env.json".to_string())).expect("parse");
        let RunRequest::Run(options) = from_env else {
            panic!("expected run request");
        };
        assert_eq!(options.scenario, Some(PathBuf::from("env.json")));

        let from_flag =
            parse_args(&args(&["--scenario", "flag.json"]), Some("env.json".to_string()))
                .expect("parse");
        let RunRequest::Run(options) = from_flag else {
            panic!("expected run request");
        };
        assert_eq!(options.scenario, Some(PathBuf::from("flag.json")));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = parse_args(&args(&["--headless", "lots"]), None).expect_err("err");
        assert!(err.contains("--headless"));
        assert!(parse_args(&args(&["--out"]), None).is_err());
        assert!(parse_args(&args(&["--bogus"]), None).is_err());
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(
            parse_args(&args(&["--headless", "3", "--help"]), None).expect("parse"),
            RunRequest::Help
        );
    }
}
