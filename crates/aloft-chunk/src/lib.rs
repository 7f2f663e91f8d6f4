//! Chunk construction: ground surface mesh plus scattered features.
#![forbid(unsafe_code)]

mod features;
mod surface;

use std::sync::Arc;
use std::time::Instant;

use aloft_geom::{DVec3, Vec3};
use aloft_world::{Biome, ChunkCoord, TerrainConfig, TerrainField};
use rand::Rng;

pub use features::{CloudPuff, Feature, FeatureKind, FeatureShape, scatter_features};
pub use surface::{SurfaceMesh, build_surface};

/// One resident square of terrain. Immutable once built.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    /// World-space corner; `surface` and `features` are relative to it.
    pub origin: DVec3,
    pub surface: SurfaceMesh,
    pub features: Vec<Feature>,
    /// Biome at the chunk center.
    pub biome: &'static Biome,
    pub created_tick: u64,
}

impl Chunk {
    #[inline]
    pub fn world_position(&self, local: Vec3) -> DVec3 {
        self.origin.offset(local)
    }

    pub fn features_of(&self, kind: FeatureKind) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(move |f| f.kind == kind)
    }

    pub fn count(&self, kind: FeatureKind) -> usize {
        self.features_of(kind).count()
    }
}

/// Builds chunks against one shared terrain field.
#[derive(Clone)]
pub struct ChunkBuilder {
    field: Arc<TerrainField>,
    cfg: Arc<TerrainConfig>,
}

impl ChunkBuilder {
    pub fn new(field: Arc<TerrainField>, cfg: Arc<TerrainConfig>) -> Self {
        Self { field, cfg }
    }

    pub fn build<R: Rng + ?Sized>(&self, coord: ChunkCoord, rng: &mut R, tick: u64) -> Chunk {
        let t0 = Instant::now();
        let size = self.cfg.stream.chunk_size;
        let (ox, oz) = coord.origin(size);
        let surface = build_surface(&self.field, coord, size, self.cfg.surface.resolution);
        let biome = self.field.biome(ox + size * 0.5, oz + size * 0.5);
        let features = scatter_features(&self.field, &self.cfg, coord, biome, rng);
        log::debug!(
            target: "chunk",
            "built {} biome={} verts={} features={} in {:?}",
            coord,
            biome.name,
            surface.vertex_count(),
            features.len(),
            t0.elapsed()
        );
        Chunk {
            coord,
            origin: DVec3::new(ox, 0.0, oz),
            surface,
            features,
            biome,
            created_tick: tick,
        }
    }

    #[inline]
    pub fn field(&self) -> &Arc<TerrainField> {
        &self.field
    }

    #[inline]
    pub fn config(&self) -> &TerrainConfig {
        &self.cfg
    }

    #[inline]
    pub fn chunk_size(&self) -> f64 {
        self.cfg.stream.chunk_size
    }
}
