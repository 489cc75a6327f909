//! Scaled-down overview maps of tile worlds with live sprite overlays.
//!
//! [`build_minimap`] renders a world's tile grid at a power-of-two
//! downscale. [`UpdateTracker`] keeps minimap displays current: each
//! refresh rebuilds the base image, stamps the tracked sprites onto it and
//! publishes the result.

pub mod builder;
pub mod config;
pub mod export;
pub mod overlay;
pub mod raster;
pub mod session;
pub mod tracker;
pub mod viewer;
pub mod world;

pub use builder::{build_minimap, MinimapCanvas, MinimapInstance, MinimapParams};
pub use config::{ConfigError, MinimapConfig, REFRESH_MS_ENV_VAR, SCALE_ENV_VAR};
pub use export::{encode_png, image_fingerprint, write_png, ExportError};
pub use overlay::{overlay_placement, overlay_sprite, OverlayPlacement};
pub use raster::{
    render_scaled, render_scaled_clipped, Footprint, ImageError, IndexedImage, Palette,
    PixelBuffer, RasterError, RenderStats, ScaleLevel, ScaleLevelError, TRANSPARENT,
};
pub use session::{MinimapSession, ViewerScene};
pub use tracker::{
    DisplayHandle, RefreshReport, RefreshTimer, TrackedSprite, TrackerError, UpdateTracker,
};
pub use viewer::{
    run_viewer, run_viewer_with_metrics, MetricsHandle, ViewerConfig, ViewerError,
    ViewerMetricsSnapshot,
};
pub use world::{
    is_destroyed, GridGeometry, Sprite, SpriteHost, SpriteId, SpriteView, TileGrid, TileId,
    TileSet, TileWorld, TilemapError, World,
};
