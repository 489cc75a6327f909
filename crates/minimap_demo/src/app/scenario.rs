use std::fs;
use std::path::{Path, PathBuf};

use minimap::world::MAX_TILE_SCALE;
use minimap::{
    IndexedImage, MinimapConfig, Palette, PixelBuffer, ScaleLevel, SpriteId, TileGrid, TileId,
    TileSet, TilemapError, World,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to load tile image {path}: {source}")]
    TileImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Tilemap(#[from] TilemapError),
    #[error("invalid scenario: {0}")]
    Invalid(String),
}

/// A world description: grid, tile palette, layout and moving sprites.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) grid: GridSpec,
    pub(crate) tiles: Vec<TileSpec>,
    /// Row-major tile ids, `rows` rows of `columns` ids. Empty means all 0.
    #[serde(default)]
    pub(crate) layout: Vec<Vec<TileId>>,
    #[serde(default)]
    pub(crate) sprites: Vec<SpriteSpec>,
    #[serde(default)]
    pub(crate) minimap: Option<MinimapConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GridSpec {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) tile_scale: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub(crate) enum TileSpec {
    Solid {
        color: u8,
    },
    Checker {
        a: u8,
        b: u8,
        #[serde(default = "default_checker_cell")]
        cell: u32,
    },
    /// Relative paths resolve against the scenario file's directory.
    Png {
        path: PathBuf,
    },
}

fn default_checker_cell() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SpriteSpec {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) color: u8,
    /// World pixels per second.
    #[serde(default)]
    pub(crate) velocity: [f32; 2],
    #[serde(default)]
    pub(crate) lifetime_ticks: Option<u32>,
    #[serde(default)]
    pub(crate) overlay_scale: ScaleLevel,
    #[serde(default = "default_tracked")]
    pub(crate) tracked: bool,
}

fn default_tracked() -> bool {
    true
}

/// A sprite placed into the world by [`Scenario::build_world`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpawnedSprite {
    pub(crate) id: SpriteId,
    pub(crate) position: (f32, f32),
    pub(crate) velocity: (f32, f32),
    pub(crate) lifetime_ticks: Option<u32>,
    pub(crate) overlay_scale: ScaleLevel,
    pub(crate) tracked: bool,
}

impl Scenario {
    pub(crate) fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|message| ScenarioError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(raw: &str) -> Result<Self, String> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        match serde_path_to_error::deserialize::<_, Scenario>(&mut deserializer) {
            Ok(scenario) => Ok(scenario),
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                if path.is_empty() || path == "." {
                    Err(source.to_string())
                } else {
                    Err(format!("at {path}: {source}"))
                }
            }
        }
    }

    /// Island in a lake with a road and a handful of wandering sprites.
    pub(crate) fn builtin() -> Self {
        const COLUMNS: usize = 32;
        const ROWS: usize = 24;
        let mut layout = vec![vec![0 as TileId; COLUMNS]; ROWS];
        for (row, cells) in layout.iter_mut().enumerate() {
            for (column, cell) in cells.iter_mut().enumerate() {
                let dx = column as i32 - COLUMNS as i32 / 2;
                let dy = row as i32 - ROWS as i32 / 2;
                let distance = dx * dx + dy * dy;
                *cell = if distance > 130 {
                    0
                } else if distance > 100 {
                    1
                } else if row == ROWS / 2 || column == COLUMNS / 2 {
                    3
                } else {
                    2
                };
            }
        }

        let sprite = |x, y, color, velocity: [f32; 2]| SpriteSpec {
            x,
            y,
            width: 16,
            height: 16,
            color,
            velocity,
            lifetime_ticks: None,
            overlay_scale: ScaleLevel::FULL,
            tracked: true,
        };
        let mut sprites = vec![
            sprite(40, 40, 5, [48.0, 20.0]),
            sprite(200, 100, 6, [-30.0, 42.0]),
            sprite(128, 96, 9, [0.0, 0.0]),
            sprite(12, 170, 8, [64.0, -12.0]),
        ];
        sprites.push(SpriteSpec {
            lifetime_ticks: Some(180),
            ..sprite(230, 20, 13, [-20.0, 25.0])
        });

        Self {
            grid: GridSpec {
                columns: COLUMNS as u32,
                rows: ROWS as u32,
                tile_scale: 3,
            },
            tiles: vec![
                TileSpec::Checker { a: 3, b: 15, cell: 2 },
                TileSpec::Solid { color: 14 },
                TileSpec::Checker { a: 1, b: 10, cell: 1 },
                TileSpec::Solid { color: 2 },
            ],
            layout,
            sprites,
            minimap: None,
        }
    }

    /// Builds the world and spawns every sprite. Spawns are applied, so the
    /// returned ids are live.
    pub(crate) fn build_world(
        &self,
        base_dir: &Path,
        palette: &Palette,
    ) -> Result<(World, Vec<SpawnedSprite>), ScenarioError> {
        let GridSpec {
            columns,
            rows,
            tile_scale,
        } = self.grid;
        if tile_scale > MAX_TILE_SCALE {
            return Err(TilemapError::TileScaleTooLarge { tile_scale }.into());
        }
        let tile_width = 1u32 << tile_scale;

        let mut images = Vec::with_capacity(self.tiles.len());
        for (index, spec) in self.tiles.iter().enumerate() {
            images.push(tile_image(spec, index, tile_width, base_dir, palette)?);
        }
        let tiles = TileSet::new(tile_scale, images)?;
        let grid = TileGrid::new(columns, rows, tile_scale, self.flat_layout()?)?;

        let mut world = World::new();
        world.set_tilemap(grid, tiles)?;

        let mut spawned = Vec::with_capacity(self.sprites.len());
        for (index, spec) in self.sprites.iter().enumerate() {
            if spec.width == 0 || spec.height == 0 {
                return Err(ScenarioError::Invalid(format!(
                    "sprites[{index}] has an empty {}x{} image",
                    spec.width, spec.height
                )));
            }
            if spec.color == 0 {
                return Err(ScenarioError::Invalid(format!(
                    "sprites[{index}].color 0 is transparent"
                )));
            }
            let image = IndexedImage::filled(spec.width, spec.height, spec.color);
            let id = world.spawn_sprite(spec.x, spec.y, image);
            spawned.push(SpawnedSprite {
                id,
                position: (spec.x as f32, spec.y as f32),
                velocity: (spec.velocity[0], spec.velocity[1]),
                lifetime_ticks: spec.lifetime_ticks,
                overlay_scale: spec.overlay_scale,
                tracked: spec.tracked,
            });
        }
        world.apply_pending();

        let (pixel_width, pixel_height) = world.pixel_size();
        info!(
            columns,
            rows,
            tile_scale,
            tiles = self.tiles.len(),
            sprites = spawned.len(),
            pixel_width,
            pixel_height,
            "scenario_world_built"
        );
        Ok((world, spawned))
    }

    fn flat_layout(&self) -> Result<Vec<TileId>, ScenarioError> {
        let columns = self.grid.columns as usize;
        let rows = self.grid.rows as usize;
        if self.layout.is_empty() {
            return Ok(vec![0; columns * rows]);
        }
        if self.layout.len() != rows {
            return Err(ScenarioError::Invalid(format!(
                "layout has {} rows, grid expects {rows}",
                self.layout.len()
            )));
        }
        let mut cells = Vec::with_capacity(columns * rows);
        for (row, ids) in self.layout.iter().enumerate() {
            if ids.len() != columns {
                return Err(ScenarioError::Invalid(format!(
                    "layout[{row}] has {} columns, grid expects {columns}",
                    ids.len()
                )));
            }
            cells.extend_from_slice(ids);
        }
        Ok(cells)
    }
}

fn tile_image(
    spec: &TileSpec,
    index: usize,
    tile_width: u32,
    base_dir: &Path,
    palette: &Palette,
) -> Result<IndexedImage, ScenarioError> {
    match spec {
        TileSpec::Solid { color } => Ok(IndexedImage::filled(tile_width, tile_width, *color)),
        TileSpec::Checker { a, b, cell } => {
            if *cell == 0 {
                return Err(ScenarioError::Invalid(format!(
                    "tiles[{index}].cell must be greater than zero"
                )));
            }
            let mut image = IndexedImage::new(tile_width, tile_width);
            for y in 0..tile_width {
                for x in 0..tile_width {
                    let value = if (x / cell + y / cell) % 2 == 0 { *a } else { *b };
                    image.set_pixel(x, y, value);
                }
            }
            Ok(image)
        }
        TileSpec::Png { path } => {
            let resolved = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            let decoded = image::open(&resolved).map_err(|source| ScenarioError::TileImage {
                path: resolved.clone(),
                source,
            })?;
            Ok(palette.quantize(&decoded.to_rgba8()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use minimap::{SpriteView, TileWorld};

    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write scenario");
        path
    }

    #[test]
    fn builtin_scenario_builds_a_world() {
        let scenario = Scenario::builtin();
        let (world, spawned) = scenario
            .build_world(Path::new("."), &Palette::default())
            .expect("world");

        assert_eq!(world.pixel_size(), (256, 192));
        assert_eq!(spawned.len(), 5);
        assert!(spawned.iter().all(|sprite| world.sprites().get(sprite.id).is_some()));
        assert_eq!(world.tile_grid().expect("grid").tile_scale, 3);
    }

    #[test]
    fn json_scenario_loads_and_applies_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "scenario.json",
            r#"{
                "grid": { "columns": 2, "rows": 1, "tile_scale": 2 },
                "tiles": [
                    { "kind": "solid", "color": 3 },
                    { "kind": "checker", "a": 1, "b": 2 }
                ],
                "layout": [[0, 1]],
                "sprites": [{ "x": 4, "y": 2, "width": 2, "height": 2, "color": 5 }],
                "minimap": { "scale": 1 }
            }"#,
        );

        let scenario = Scenario::load(&path).expect("load");
        let minimap = scenario.minimap.clone().expect("minimap block");
        assert_eq!(minimap.scale, ScaleLevel::HALF);
        assert_eq!(minimap.border_width, MinimapConfig::default().border_width);

        let (world, spawned) = scenario
            .build_world(dir.path(), &Palette::default())
            .expect("world");
        assert_eq!(world.tile_image(1, 0).expect("tile").pixel(0, 0), 1);
        assert_eq!(world.tile_image(1, 0).expect("tile").pixel(2, 0), 2);
        assert_eq!(spawned[0].velocity, (0.0, 0.0));
        assert!(spawned[0].tracked);
        assert_eq!(spawned[0].overlay_scale, ScaleLevel::FULL);
        let sprite = world.sprites().get(spawned[0].id).expect("sprite");
        assert_eq!(sprite.world_position(), (4, 2));
    }

    #[test]
    fn parse_errors_carry_json_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "bad.json",
            r#"{ "grid": { "columns": 2, "rows": 1, "tile_scale": 2 },
                 "tiles": [{ "kind": "solid", "color": 300 }] }"#,
        );

        let err = Scenario::load(&path).expect_err("should fail");
        let ScenarioError::Parse { message, .. } = err else {
            panic!("expected parse error, got {err:?}");
        };
        assert!(message.contains("tiles[0]"), "{message}");
    }

    #[test]
    fn layout_shape_and_tile_ids_are_validated() {
        let mut scenario = Scenario::builtin();
        scenario.layout.pop();
        let err = scenario
            .build_world(Path::new("."), &Palette::default())
            .expect_err("short layout");
        assert!(matches!(err, ScenarioError::Invalid(_)));

        let mut scenario = Scenario::builtin();
        scenario.layout[0][0] = 99;
        let err = scenario
            .build_world(Path::new("."), &Palette::default())
            .expect_err("unknown tile");
        assert!(matches!(
            err,
            ScenarioError::Tilemap(TilemapError::UnknownTile { id: 99, .. })
        ));
    }

    #[test]
    fn transparent_sprite_colour_is_rejected() {
        let mut scenario = Scenario::builtin();
        scenario.sprites[0].color = 0;
        assert!(matches!(
            scenario.build_world(Path::new("."), &Palette::default()),
            Err(ScenarioError::Invalid(_))
        ));
    }

    #[test]
    fn png_tiles_are_quantized_against_the_palette() {
        let dir = tempfile::tempdir().expect("tempdir");
        let palette = Palette::default();
        let mut rgba = image::RgbaImage::new(4, 4);
        for pixel in rgba.pixels_mut() {
            *pixel = image::Rgba(palette.color(5));
        }
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        rgba.save(dir.path().join("tile.png")).expect("save png");

        let scenario = Scenario {
            grid: GridSpec {
                columns: 1,
                rows: 1,
                tile_scale: 2,
            },
            tiles: vec![TileSpec::Png {
                path: PathBuf::from("tile.png"),
            }],
            layout: Vec::new(),
            sprites: Vec::new(),
            minimap: None,
        };
        let (world, _) = scenario.build_world(dir.path(), &palette).expect("world");
        let tile = world.tile_image(0, 0).expect("tile");
        assert_eq!(tile.pixel(0, 0), 0);
        assert_eq!(tile.pixel(1, 1), 5);
    }

    #[test]
    fn missing_png_reports_resolved_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scenario = Scenario {
            grid: GridSpec {
                columns: 1,
                rows: 1,
                tile_scale: 2,
            },
            tiles: vec![TileSpec::Png {
                path: PathBuf::from("missing.png"),
            }],
            layout: Vec::new(),
            sprites: Vec::new(),
            minimap: None,
        };
        let err = scenario
            .build_world(dir.path(), &Palette::default())
            .expect_err("missing");
        let ScenarioError::TileImage { path, .. } = err else {
            panic!("expected tile image error, got {err:?}");
        };
        assert_eq!(path, dir.path().join("missing.png"));
    }
}
