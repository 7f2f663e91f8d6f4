use std::sync::Arc;

use aloft_geom::Rgb;

use crate::biome::{Biome, BiomeClassifier, BlendParams};
use crate::config::{ConfigError, TerrainConfig};
use crate::height::HeightField;
use crate::noise::{NoiseField, SimplexField};

/// Rounds `v` onto a grid of `steps_per_unit` cells per world unit.
///
/// Every surface sample goes through this, so two chunks evaluating the
/// same edge vertex from different origins hand identical inputs to noise.
#[inline]
pub fn snap_to_precision(v: f64, steps_per_unit: f64) -> f64 {
    (v * steps_per_unit).round() / steps_per_unit
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
    pub height: f32,
    pub color: Rgb,
}

/// Height and biome queries over one seeded world, shared read-only
/// between the streamer and any build workers.
pub struct TerrainField {
    seed: i32,
    heights: HeightField,
    biomes: BiomeClassifier,
    water_level: f32,
    precision: f64,
}

impl TerrainField {
    pub fn from_config(cfg: &TerrainConfig) -> Result<Self, ConfigError> {
        let noise: Arc<dyn NoiseField> = Arc::new(SimplexField::new(cfg.seed));
        Self::with_noise(Some(noise), cfg)
    }

    /// Builds the field over an explicit noise source. `None` yields a flat
    /// world of the default biome.
    pub fn with_noise(noise: Option<Arc<dyn NoiseField>>, cfg: &TerrainConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        if noise.is_none() {
            log::warn!(target: "terrain", "no noise source; terrain will be flat with the default biome");
        }
        let blend = BlendParams {
            distance: cfg.biomes.blend_distance,
            center_weight: cfg.biomes.center_weight,
            neighbor_weight: cfg.biomes.neighbor_weight,
        };
        Ok(Self {
            seed: cfg.seed,
            heights: HeightField::new(noise.clone(), cfg.height.octaves.clone()),
            biomes: BiomeClassifier::new(noise, cfg.biomes.octaves.clone(), blend),
            water_level: cfg.surface.water_level,
            precision: cfg.surface.coord_precision,
        })
    }

    #[inline]
    pub fn height(&self, x: f64, z: f64) -> f32 {
        self.heights.height(x, z)
    }

    #[inline]
    pub fn biome(&self, x: f64, z: f64) -> &'static Biome {
        self.biomes.classify(x, z)
    }

    #[inline]
    pub fn blended_color(&self, x: f64, z: f64) -> Rgb {
        self.biomes.blended_color(x, z)
    }

    #[inline]
    pub fn snap(&self, v: f64) -> f64 {
        snap_to_precision(v, self.precision)
    }

    /// Ground height and color at the snapped position nearest `(x, z)`.
    pub fn sample_surface(&self, x: f64, z: f64) -> SurfaceSample {
        let (sx, sz) = (self.snap(x), self.snap(z));
        SurfaceSample {
            height: self.heights.height(sx, sz),
            color: self.biomes.blended_color(sx, sz),
        }
    }

    #[inline]
    pub fn water_level(&self) -> f32 {
        self.water_level
    }

    #[inline]
    pub fn seed(&self) -> i32 {
        self.seed
    }

    #[inline]
    pub fn heights(&self) -> &HeightField {
        &self.heights
    }

    #[inline]
    pub fn biomes(&self) -> &BiomeClassifier {
        &self.biomes
    }

    /// Recovered height plus biome sampling failures since construction.
    pub fn sample_failures(&self) -> u64 {
        self.heights.failures() + self.biomes.failures()
    }
}
