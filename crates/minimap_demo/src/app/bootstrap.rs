use std::path::{Path, PathBuf};

use minimap::{
    ConfigError, MinimapConfig, MinimapSession, Palette, TrackerError, UpdateTracker,
    ViewerConfig,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::args::DemoOptions;
use super::scenario::{Scenario, ScenarioError};
use super::scene::DemoScene;

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

pub(crate) enum RunMode {
    Window(ViewerConfig),
    Headless { ticks: u32, out_dir: PathBuf },
}

pub(crate) struct AppWiring {
    pub(crate) mode: RunMode,
    pub(crate) session: MinimapSession,
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn build_app(options: DemoOptions) -> Result<AppWiring, StartupError> {
    info!("=== Minimap Demo Startup ===");

    let (scenario, base_dir) = match &options.scenario {
        Some(path) => (Scenario::load(path)?, scenario_dir(path)),
        None => (Scenario::builtin(), PathBuf::from(".")),
    };
    let config = resolve_config(&scenario, options.config.as_deref())?;
    info!(
        scenario = %options
            .scenario
            .as_deref()
            .map_or_else(|| "builtin".to_string(), |path| path.display().to_string()),
        scale = %config.scale,
        border_width = config.border_width,
        refresh_interval_ms = config.refresh_interval_ms,
        "demo_config_resolved"
    );

    let session = build_session(&scenario, &base_dir, &config)?;
    let mode = match options.headless_ticks {
        Some(ticks) => RunMode::Headless {
            ticks,
            out_dir: options.out_dir,
        },
        None => RunMode::Window(ViewerConfig {
            window_title: "Minimap Demo".to_string(),
            ..ViewerConfig::default()
        }),
    };
    Ok(AppWiring { mode, session })
}

/// Defaults, then the scenario's `minimap` block, then `--config`, then
/// environment overrides.
fn resolve_config(
    scenario: &Scenario,
    config_path: Option<&Path>,
) -> Result<MinimapConfig, ConfigError> {
    let config = match config_path {
        Some(path) => MinimapConfig::load(path)?,
        None => scenario.minimap.clone().unwrap_or_default(),
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

pub(crate) fn build_session(
    scenario: &Scenario,
    base_dir: &Path,
    config: &MinimapConfig,
) -> Result<MinimapSession, StartupError> {
    let palette = Palette::default();
    let (world, spawned) = scenario.build_world(base_dir, &palette)?;

    let mut tracker = UpdateTracker::new(config.max_refreshes_per_advance);
    let display = tracker.create_display(&world, config.params());
    for sprite in spawned.iter().filter(|sprite| sprite.tracked) {
        tracker.track(display, sprite.id, sprite.overlay_scale)?;
    }
    tracker.refresh(display, &world)?;
    tracker.start_periodic_refresh(display, config.refresh_interval())?;

    let scene = DemoScene::new(&spawned);
    Ok(MinimapSession::new(
        world,
        tracker,
        display,
        palette,
        Box::new(scene),
    ))
}

fn scenario_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
