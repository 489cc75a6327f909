use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::builder::MinimapParams;
use crate::raster::ScaleLevel;
use crate::tracker::DEFAULT_MAX_REFRESHES_PER_ADVANCE;

pub const SCALE_ENV_VAR: &str = "MINIMAP_SCALE";
pub const REFRESH_MS_ENV_VAR: &str = "MINIMAP_REFRESH_MS";
pub const MAX_BORDER_WIDTH: u32 = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read minimap config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse minimap config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid minimap config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    pub scale: ScaleLevel,
    pub border_width: u32,
    pub border_color: u8,
    pub refresh_interval_ms: u64,
    pub max_refreshes_per_advance: u32,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            scale: ScaleLevel::QUARTER,
            border_width: 2,
            border_color: 12,
            refresh_interval_ms: 250,
            max_refreshes_per_advance: DEFAULT_MAX_REFRESHES_PER_ADVANCE,
        }
    }
}

impl MinimapConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_refreshes_per_advance == 0 {
            return Err(ConfigError::Invalid(
                "max_refreshes_per_advance must be greater than zero".to_string(),
            ));
        }
        if self.border_width > MAX_BORDER_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "border_width {} exceeds maximum {MAX_BORDER_WIDTH}",
                self.border_width
            )));
        }
        Ok(())
    }

    pub fn params(&self) -> MinimapParams {
        MinimapParams {
            scale: self.scale,
            border_width: self.border_width,
            border_color: self.border_color,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| env::var(name))
    }

    /// Applies `MINIMAP_SCALE` and `MINIMAP_REFRESH_MS` as read by `lookup`.
    /// Unset variables keep the current value; invalid ones are logged and
    /// ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        if let Some(scale) = read_override(&lookup, SCALE_ENV_VAR, |raw| {
            raw.parse::<u8>().ok().and_then(|exponent| ScaleLevel::new(exponent).ok())
        }) {
            self.scale = scale;
        }
        if let Some(interval_ms) = read_override(&lookup, REFRESH_MS_ENV_VAR, |raw| {
            raw.parse::<u64>().ok().filter(|ms| *ms > 0)
        }) {
            self.refresh_interval_ms = interval_ms;
        }
        self
    }
}

fn read_override<F, T>(
    lookup: &F,
    env_var: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(env_var) {
        Ok(value) => {
            let parsed = parse(value.trim());
            if parsed.is_none() {
                warn!(
                    env_var,
                    value = value.as_str(),
                    "invalid minimap env var value; falling back to config"
                );
            }
            parsed
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                env_var,
                error = %err,
                "unable to read minimap env var; falling back to config"
            );
            None
        }
    }
}
