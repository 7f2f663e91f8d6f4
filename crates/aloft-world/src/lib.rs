//! Terrain field sampling: noise, height, biomes, and the parameters that drive them.
#![forbid(unsafe_code)]

pub mod biome;
mod chunk_coord;
pub mod config;
pub mod contact;
mod field;
pub mod height;
pub mod noise;
pub mod water;

pub use biome::{BIOMES, Biome, BiomeClassifier, BiomeKind, BlendParams};
pub use chunk_coord::ChunkCoord;
pub use config::{ConfigError, TerrainConfig, load_config_from_path};
pub use field::{SurfaceSample, TerrainField, snap_to_precision};
pub use height::HeightField;
pub use noise::{NoiseField, Octave, SampleError, SimplexField};
