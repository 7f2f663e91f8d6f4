use aloft_geom::DVec3;
use aloft_world::{Biome, ChunkCoord, ConfigError, TerrainConfig, TerrainField};

use crate::events::ChunkSink;
use crate::store::{ChunkStore, EnsureOutcome};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub center: ChunkCoord,
    /// Chunks built inline this tick.
    pub built: usize,
    /// Builds handed to workers this tick.
    pub queued: usize,
    /// Finished background builds installed this tick.
    pub installed: usize,
    pub evicted: usize,
    pub resident: usize,
    pub in_flight: usize,
}

/// Keeps the square window of chunks around the viewpoint resident.
pub struct Streamer {
    view_distance: u32,
    chunk_size: f64,
    center: Option<ChunkCoord>,
}

impl Streamer {
    pub fn new(view_distance: i32, chunk_size: f64) -> Result<Self, ConfigError> {
        if view_distance < 0 {
            return Err(ConfigError::NegativeViewDistance(view_distance));
        }
        if !(chunk_size.is_finite() && chunk_size > 0.0) {
            return Err(ConfigError::NonPositiveChunkSize(chunk_size));
        }
        Ok(Self {
            view_distance: view_distance as u32,
            chunk_size,
            center: None,
        })
    }

    pub fn from_config(cfg: &TerrainConfig) -> Result<Self, ConfigError> {
        Self::new(cfg.stream.view_distance, cfg.stream.chunk_size)
    }

    #[inline]
    pub fn view_distance(&self) -> u32 {
        self.view_distance
    }

    /// Chunk the viewpoint was in on the last tick.
    #[inline]
    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    #[inline]
    pub fn chunk_of(&self, viewpoint: DVec3) -> ChunkCoord {
        ChunkCoord::containing(viewpoint.x, viewpoint.z, self.chunk_size)
    }

    /// Every key within `view_distance` of `center`, nearest ring first and
    /// by squared distance within a ring.
    pub fn window(&self, center: ChunkCoord) -> Vec<ChunkCoord> {
        let vd = self.view_distance as i32;
        let mut keys = Vec::with_capacity(((2 * vd + 1) * (2 * vd + 1)) as usize);
        for dz in -vd..=vd {
            for dx in -vd..=vd {
                keys.push(center.offset(dx, dz));
            }
        }
        keys.sort_by_key(|&k| (center.chebyshev(k), center.distance_sq(k), k));
        // Keys clamped at the grid edge collapse onto each other.
        keys.dedup();
        keys
    }

    pub fn tick<S: ChunkSink>(&mut self, store: &mut ChunkStore<S>, viewpoint: DVec3) -> TickReport {
        debug_assert_eq!(
            self.chunk_size,
            store.config().stream.chunk_size,
            "streamer and store disagree on chunk size"
        );
        let tick = store.advance_clock();
        let installed = store.pump();
        let mut report = TickReport {
            tick,
            installed,
            ..TickReport::default()
        };

        if !(viewpoint.x.is_finite() && viewpoint.z.is_finite()) {
            log::warn!(target: "stream", "[tick {}] ignoring non-finite viewpoint {:?}", tick, viewpoint);
            report.center = self.center.unwrap_or_default();
            report.resident = store.len();
            report.in_flight = store.in_flight_len();
            return report;
        }

        let center = self.chunk_of(viewpoint);
        report.center = center;
        if self.center != Some(center) {
            log::info!(
                target: "stream",
                "[tick {}] view center {} -> {}",
                tick,
                self.center.map_or_else(|| "none".to_string(), |c| c.to_string()),
                center
            );
            self.center = Some(center);
        }

        for key in self.window(center) {
            match store.ensure_chunk(key.cx, key.cz) {
                EnsureOutcome::Built => report.built += 1,
                EnsureOutcome::Queued => report.queued += 1,
                EnsureOutcome::AlreadyResident | EnsureOutcome::AlreadyInFlight => {}
            }
        }

        let limit = self.view_distance.saturating_add(1);
        let stale: Vec<ChunkCoord> = store
            .resident_coords()
            .into_iter()
            .chain(store.in_flight_coords())
            .filter(|&k| center.chebyshev(k) > limit)
            .collect();
        for key in stale {
            if store.evict_chunk(key.cx, key.cz) {
                report.evicted += 1;
            }
        }

        report.resident = store.len();
        report.in_flight = store.in_flight_len();
        if report.built + report.queued + report.installed + report.evicted > 0 {
            log::debug!(
                target: "stream",
                "[tick {}] built={} queued={} installed={} evicted={} resident={} in_flight={}",
                tick,
                report.built,
                report.queued,
                report.installed,
                report.evicted,
                report.resident,
                report.in_flight
            );
        }
        report
    }

    /// Biome under the viewpoint, for the HUD.
    #[inline]
    pub fn current_biome(&self, field: &TerrainField, viewpoint: DVec3) -> &'static Biome {
        field.biome(viewpoint.x, viewpoint.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_nearest_first() {
        let s = Streamer::new(2, 400.0).expect("streamer");
        let c = ChunkCoord::new(5, -5);
        let w = s.window(c);
        assert_eq!(w.len(), 25);
        assert_eq!(w[0], c);
        for pair in w.windows(2) {
            let a = (c.chebyshev(pair[0]), c.distance_sq(pair[0]));
            let b = (c.chebyshev(pair[1]), c.distance_sq(pair[1]));
            assert!(a <= b);
        }
    }

    #[test]
    fn zero_view_distance_is_one_chunk() {
        let s = Streamer::new(0, 400.0).expect("streamer");
        assert_eq!(s.window(ChunkCoord::new(1, 1)), vec![ChunkCoord::new(1, 1)]);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(Streamer::new(-1, 400.0), Err(ConfigError::NegativeViewDistance(-1))));
        assert!(Streamer::new(3, 0.0).is_err());
        assert!(Streamer::new(3, f64::INFINITY).is_err());
    }

    #[test]
    fn window_at_grid_edge_has_no_duplicates() {
        let s = Streamer::new(1, 400.0).expect("streamer");
        let w = s.window(ChunkCoord::new(i32::MAX, 0));
        assert_eq!(w.len(), 6);
        assert_eq!(w[0], ChunkCoord::new(i32::MAX, 0));
        assert!(w.iter().all(|k| k.cx >= i32::MAX - 1));
    }

    #[test]
    fn viewpoint_maps_with_floor() {
        let s = Streamer::new(3, 400.0).expect("streamer");
        assert_eq!(s.chunk_of(DVec3::new(-0.5, 900.0, 401.0)), ChunkCoord::new(-1, 1));
    }
}
