use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::biome::DEFAULT_BIOME_OCTAVES;
use crate::height::DEFAULT_HEIGHT_OCTAVES;
use crate::noise::Octave;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("chunk_size must be positive and finite, got {0}")]
    NonPositiveChunkSize(f64),
    #[error("view_distance must be non-negative, got {0}")]
    NegativeViewDistance(i32),
    #[error("surface resolution must be at least 1")]
    ZeroResolution,
    #[error("coord_precision must be positive and finite, got {0}")]
    NonPositivePrecision(f64),
    #[error("{0} octave list is empty")]
    EmptyOctaves(&'static str),
    #[error("{section} octave {index} has a non-finite frequency or amplitude")]
    InvalidOctave { section: &'static str, index: usize },
    #[error("{name} must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f32 },
    #[error("{name} range is invalid: [{min}, {max}]")]
    InvalidRange { name: &'static str, min: f64, max: f64 },
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainConfig {
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default)]
    pub stream: Stream,
    #[serde(default)]
    pub surface: Surface,
    #[serde(default)]
    pub height: Height,
    #[serde(default)]
    pub biomes: Biomes,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub clouds: Clouds,
    #[serde(default)]
    pub runtime: Runtime,
}

fn default_seed() -> i32 {
    42
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            stream: Stream::default(),
            surface: Surface::default(),
            height: Height::default(),
            biomes: Biomes::default(),
            features: Features::default(),
            clouds: Clouds::default(),
            runtime: Runtime::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Stream {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: f64,
    #[serde(default = "default_view_distance")]
    pub view_distance: i32,
}
fn default_chunk_size() -> f64 {
    400.0
}
fn default_view_distance() -> i32 {
    3
}
impl Default for Stream {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            view_distance: default_view_distance(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Surface {
    /// Quads per chunk edge; the vertex grid is `(resolution + 1)^2`.
    #[serde(default = "default_resolution")]
    pub resolution: u32,
    /// Sampling grid steps per world unit (100 snaps to 0.01).
    #[serde(default = "default_coord_precision")]
    pub coord_precision: f64,
    #[serde(default = "default_water_level")]
    pub water_level: f32,
}
fn default_resolution() -> u32 {
    64
}
fn default_coord_precision() -> f64 {
    100.0
}
fn default_water_level() -> f32 {
    -20.0
}
impl Default for Surface {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            coord_precision: default_coord_precision(),
            water_level: default_water_level(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Height {
    #[serde(default = "default_height_octaves")]
    pub octaves: Vec<Octave>,
}
fn default_height_octaves() -> Vec<Octave> {
    DEFAULT_HEIGHT_OCTAVES.to_vec()
}
impl Default for Height {
    fn default() -> Self {
        Self {
            octaves: default_height_octaves(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Biomes {
    #[serde(default = "default_biome_octaves")]
    pub octaves: Vec<Octave>,
    #[serde(default = "default_blend_distance")]
    pub blend_distance: f64,
    #[serde(default = "default_center_weight")]
    pub center_weight: f32,
    #[serde(default = "default_neighbor_weight")]
    pub neighbor_weight: f32,
}
fn default_biome_octaves() -> Vec<Octave> {
    DEFAULT_BIOME_OCTAVES.to_vec()
}
fn default_blend_distance() -> f64 {
    20.0
}
fn default_center_weight() -> f32 {
    1.0
}
fn default_neighbor_weight() -> f32 {
    0.3
}
impl Default for Biomes {
    fn default() -> Self {
        Self {
            octaves: default_biome_octaves(),
            blend_distance: default_blend_distance(),
            center_weight: default_center_weight(),
            neighbor_weight: default_neighbor_weight(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Features {
    #[serde(default)]
    pub trees: Trees,
    #[serde(default)]
    pub house: House,
    #[serde(default)]
    pub buildings: Buildings,
    #[serde(default)]
    pub rocks: Rocks,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Trees {
    #[serde(default = "default_tree_attempts")]
    pub attempts: u32,
    #[serde(default = "default_tree_buffer")]
    pub water_buffer: f32,
    #[serde(default = "default_tree_scale")]
    pub scale: [f32; 2],
    #[serde(default = "default_trunk_height")]
    pub trunk_height: [f32; 2],
    #[serde(default = "default_canopy_radius")]
    pub canopy_radius: [f32; 2],
    #[serde(default = "default_canopy_height")]
    pub canopy_height: [f32; 2],
    #[serde(default = "default_leaf_hue")]
    pub leaf_hue: [f32; 2],
}
fn default_tree_attempts() -> u32 {
    35
}
fn default_tree_buffer() -> f32 {
    2.0
}
fn default_tree_scale() -> [f32; 2] {
    [0.7, 1.3]
}
fn default_trunk_height() -> [f32; 2] {
    [6.0, 10.0]
}
fn default_canopy_radius() -> [f32; 2] {
    [3.0, 5.0]
}
fn default_canopy_height() -> [f32; 2] {
    [5.0, 8.0]
}
fn default_leaf_hue() -> [f32; 2] {
    [0.25, 0.40]
}
impl Default for Trees {
    fn default() -> Self {
        Self {
            attempts: default_tree_attempts(),
            water_buffer: default_tree_buffer(),
            scale: default_tree_scale(),
            trunk_height: default_trunk_height(),
            canopy_radius: default_canopy_radius(),
            canopy_height: default_canopy_height(),
            leaf_hue: default_leaf_hue(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct House {
    #[serde(default = "default_house_chance")]
    pub chance: f32,
    #[serde(default = "default_house_buffer")]
    pub water_buffer: f32,
    /// Fraction of the chunk edge, centered, that may hold the house.
    #[serde(default = "default_house_span")]
    pub span: f64,
}
fn default_house_chance() -> f32 {
    0.1
}
fn default_house_buffer() -> f32 {
    2.0
}
fn default_house_span() -> f64 {
    0.5
}
impl Default for House {
    fn default() -> Self {
        Self {
            chance: default_house_chance(),
            water_buffer: default_house_buffer(),
            span: default_house_span(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Buildings {
    #[serde(default = "default_cluster_chance")]
    pub chance: f32,
    #[serde(default = "default_cluster_count")]
    pub count: [u32; 2],
    #[serde(default = "default_cluster_radius")]
    pub radius: f64,
    #[serde(default = "default_cluster_span")]
    pub center_span: f64,
    #[serde(default = "default_building_buffer")]
    pub water_buffer: f32,
    #[serde(default = "default_building_footprint")]
    pub footprint: [f32; 2],
    #[serde(default = "default_building_height")]
    pub height: [f32; 2],
    #[serde(default = "default_window_spacing")]
    pub window_spacing: f32,
}
fn default_cluster_chance() -> f32 {
    0.2
}
fn default_cluster_count() -> [u32; 2] {
    [8, 15]
}
fn default_cluster_radius() -> f64 {
    80.0
}
fn default_cluster_span() -> f64 {
    0.6
}
fn default_building_buffer() -> f32 {
    5.0
}
fn default_building_footprint() -> [f32; 2] {
    [12.0, 28.0]
}
fn default_building_height() -> [f32; 2] {
    [20.0, 50.0]
}
fn default_window_spacing() -> f32 {
    4.0
}
impl Default for Buildings {
    fn default() -> Self {
        Self {
            chance: default_cluster_chance(),
            count: default_cluster_count(),
            radius: default_cluster_radius(),
            center_span: default_cluster_span(),
            water_buffer: default_building_buffer(),
            footprint: default_building_footprint(),
            height: default_building_height(),
            window_spacing: default_window_spacing(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Rocks {
    #[serde(default = "default_rock_attempts")]
    pub attempts: u32,
    #[serde(default = "default_rock_chance")]
    pub chance: f32,
    #[serde(default = "default_rock_radius")]
    pub radius: [f32; 2],
    #[serde(default = "default_rock_buffer")]
    pub water_buffer: f32,
}
fn default_rock_attempts() -> u32 {
    5
}
fn default_rock_chance() -> f32 {
    0.3
}
fn default_rock_radius() -> [f32; 2] {
    [1.0, 3.0]
}
fn default_rock_buffer() -> f32 {
    1.0
}
impl Default for Rocks {
    fn default() -> Self {
        Self {
            attempts: default_rock_attempts(),
            chance: default_rock_chance(),
            radius: default_rock_radius(),
            water_buffer: default_rock_buffer(),
        }
    }
}

/// One cloud deck. Ranges are inclusive `[min, max]`.
#[derive(Clone, Debug, Deserialize)]
pub struct CloudLayer {
    pub attempts: [u32; 2],
    pub chance: f32,
    pub altitude: [f32; 2],
    pub puffs: [u32; 2],
    pub puff_radius: [f32; 2],
    /// Radius of the disc the puffs are scattered in.
    pub cluster: [f32; 2],
    /// Vertical jitter of puffs around the group altitude.
    pub puff_jitter: f32,
    pub speed: [f32; 2],
}

impl CloudLayer {
    pub fn low() -> Self {
        Self {
            attempts: [1, 3],
            chance: 0.3,
            altitude: [300.0, 400.0],
            puffs: [6, 13],
            puff_radius: [4.0, 12.0],
            cluster: [15.0, 25.0],
            puff_jitter: 8.0,
            speed: [0.1, 0.3],
        }
    }

    pub fn high() -> Self {
        Self {
            attempts: [2, 5],
            chance: 0.6,
            altitude: [500.0, 650.0],
            puffs: [8, 19],
            puff_radius: [15.0, 40.0],
            cluster: [40.0, 70.0],
            puff_jitter: 20.0,
            speed: [0.05, 0.15],
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Clouds {
    #[serde(default = "CloudLayer::low")]
    pub low: CloudLayer,
    #[serde(default = "CloudLayer::high")]
    pub high: CloudLayer,
}
impl Default for Clouds {
    fn default() -> Self {
        Self {
            low: CloudLayer::low(),
            high: CloudLayer::high(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Runtime {
    /// Background build threads; `0` builds inline on the calling thread.
    #[serde(default)]
    pub workers: usize,
    /// Fixes feature scatter for reproducible runs; unset draws from the OS.
    #[serde(default)]
    pub scatter_seed: Option<u64>,
}

impl TerrainConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: TerrainConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.stream.chunk_size;
        if !(size.is_finite() && size > 0.0) {
            return Err(ConfigError::NonPositiveChunkSize(size));
        }
        if self.stream.view_distance < 0 {
            return Err(ConfigError::NegativeViewDistance(self.stream.view_distance));
        }
        if self.surface.resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        let p = self.surface.coord_precision;
        if !(p.is_finite() && p > 0.0) {
            return Err(ConfigError::NonPositivePrecision(p));
        }
        check_octaves("height", &self.height.octaves)?;
        check_octaves("biome", &self.biomes.octaves)?;
        check_range("biomes.blend", 0.0, self.biomes.blend_distance)?;

        let f = &self.features;
        check_probability("features.house.chance", f.house.chance)?;
        check_probability("features.buildings.chance", f.buildings.chance)?;
        check_probability("features.rocks.chance", f.rocks.chance)?;
        check_probability("features.house.span", f.house.span as f32)?;
        check_probability("features.buildings.center_span", f.buildings.center_span as f32)?;
        check_range_f32("features.trees.scale", f.trees.scale)?;
        check_range_f32("features.trees.trunk_height", f.trees.trunk_height)?;
        check_range_f32("features.trees.canopy_radius", f.trees.canopy_radius)?;
        check_range_f32("features.trees.canopy_height", f.trees.canopy_height)?;
        check_range_f32("features.trees.leaf_hue", f.trees.leaf_hue)?;
        check_range_u32("features.buildings.count", f.buildings.count)?;
        check_range_f32("features.buildings.footprint", f.buildings.footprint)?;
        check_range_f32("features.buildings.height", f.buildings.height)?;
        check_range("features.buildings.radius", 0.0, f.buildings.radius)?;
        if !(f.buildings.window_spacing > 0.0) {
            return Err(ConfigError::InvalidRange {
                name: "features.buildings.window_spacing",
                min: 0.0,
                max: f64::from(f.buildings.window_spacing),
            });
        }
        check_range_f32("features.rocks.radius", f.rocks.radius)?;

        for (name, layer) in [("clouds.low", &self.clouds.low), ("clouds.high", &self.clouds.high)] {
            check_probability(name, layer.chance)?;
            check_range_u32(name, layer.attempts)?;
            check_range_u32(name, layer.puffs)?;
            check_range_f32(name, layer.altitude)?;
            check_range_f32(name, layer.puff_radius)?;
            check_range_f32(name, layer.cluster)?;
            check_range_f32(name, layer.speed)?;
        }
        Ok(())
    }
}

fn check_octaves(section: &'static str, octaves: &[Octave]) -> Result<(), ConfigError> {
    if octaves.is_empty() {
        return Err(ConfigError::EmptyOctaves(section));
    }
    for (index, o) in octaves.iter().enumerate() {
        if !o.frequency.is_finite() || !o.amplitude.is_finite() {
            return Err(ConfigError::InvalidOctave { section, index });
        }
    }
    Ok(())
}

fn check_probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

fn check_range(name: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { name, min, max })
    }
}

fn check_range_f32(name: &'static str, r: [f32; 2]) -> Result<(), ConfigError> {
    check_range(name, f64::from(r[0]), f64::from(r[1]))
}

fn check_range_u32(name: &'static str, r: [u32; 2]) -> Result<(), ConfigError> {
    check_range(name, f64::from(r[0]), f64::from(r[1]))
}

pub fn load_config_from_path(path: &Path) -> Result<TerrainConfig, ConfigError> {
    let s = fs::read_to_string(path)?;
    TerrainConfig::from_toml_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = TerrainConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.stream.chunk_size, 400.0);
        assert_eq!(cfg.stream.view_distance, 3);
        assert_eq!(cfg.surface.resolution, 64);
        assert_eq!(cfg.surface.water_level, -20.0);
        assert_eq!(cfg.height.octaves.len(), 5);
        assert_eq!(cfg.biomes.octaves.len(), 3);
        assert_eq!(cfg.runtime.workers, 0);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = TerrainConfig::from_toml_str("").expect("empty config");
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.features.trees.attempts, 35);
        assert_eq!(cfg.clouds.high.altitude, [500.0, 650.0]);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let src = r#"
            seed = 7
            [stream]
            view_distance = 1
            [height]
            octaves = [{ frequency = 0.001, amplitude = 50.0 }]
            [runtime]
            workers = 2
            scatter_seed = 99
        "#;
        let cfg = TerrainConfig::from_toml_str(src).expect("parse");
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.stream.view_distance, 1);
        assert_eq!(cfg.stream.chunk_size, 400.0);
        assert_eq!(cfg.height.octaves, vec![Octave::new(0.001, 50.0)]);
        assert_eq!(cfg.runtime.workers, 2);
        assert_eq!(cfg.runtime.scatter_seed, Some(99));
    }

    #[test]
    fn rejects_invalid_values() {
        let mut cfg = TerrainConfig::default();
        cfg.stream.view_distance = -1;
        assert!(matches!(cfg.validate(), Err(ConfigError::NegativeViewDistance(-1))));

        let mut cfg = TerrainConfig::default();
        cfg.stream.chunk_size = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositiveChunkSize(_))));

        let mut cfg = TerrainConfig::default();
        cfg.stream.chunk_size = f64::NAN;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositiveChunkSize(_))));

        let mut cfg = TerrainConfig::default();
        cfg.surface.resolution = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroResolution)));

        let mut cfg = TerrainConfig::default();
        cfg.height.octaves.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyOctaves("height"))));

        let mut cfg = TerrainConfig::default();
        cfg.features.rocks.chance = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::ProbabilityOutOfRange { .. })));

        let mut cfg = TerrainConfig::default();
        cfg.clouds.low.altitude = [400.0, 300.0];
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidRange { .. })));
    }

    #[test]
    fn parse_errors_surface_as_config_errors() {
        let err = TerrainConfig::from_toml_str("seed = \"nope\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = TerrainConfig::from_toml_str("[stream]\nview_distance = -2").unwrap_err();
        assert!(matches!(err, ConfigError::NegativeViewDistance(-2)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_config_from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
