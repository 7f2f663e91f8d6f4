//! Per-tick ambient motion derived from the logical clock.
use aloft_chunk::{Chunk, Feature, FeatureKind};
use aloft_geom::DVec3;
use aloft_world::ChunkCoord;
use aloft_world::water::scroll_offset;

use crate::events::ChunkSink;
use crate::store::ChunkStore;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudSnapshot {
    pub coord: ChunkCoord,
    pub kind: FeatureKind,
    pub position: DVec3,
}

/// World position of a cloud group at `tick`; other features stay put.
pub fn cloud_world_position(chunk: &Chunk, feature: &Feature, tick: u64) -> DVec3 {
    let age = tick.saturating_sub(chunk.created_tick);
    chunk.world_position(feature.position + feature.drift(age))
}

/// Every resident cloud group at the store's current tick.
pub fn cloud_positions<S: ChunkSink>(store: &ChunkStore<S>) -> Vec<CloudSnapshot> {
    let tick = store.clock();
    let mut out = Vec::new();
    store.for_each_resident(|chunk| {
        for f in chunk.features.iter().filter(|f| f.kind.is_cloud()) {
            out.push(CloudSnapshot {
                coord: chunk.coord,
                kind: f.kind,
                position: cloud_world_position(chunk, f, tick),
            });
        }
    });
    out
}

/// Water texture scroll at the store's current tick.
#[inline]
pub fn water_offset<S: ChunkSink>(store: &ChunkStore<S>) -> (f32, f32) {
    scroll_offset(store.clock())
}
