use std::sync::Arc;

use aloft_chunk::Chunk;
use aloft_geom::DVec3;
use aloft_runtime::{ChunkSink, ChunkStore, RuntimeError, Streamer, cloud_positions, water_offset};
use aloft_world::contact::{Contact, probe};
use aloft_world::water::{WAVE_TEXTURE_SIZE, wave_texture};
use aloft_world::{ChunkCoord, TerrainConfig, TerrainField};
use hashbrown::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathKind {
    Straight,
    Circle,
}

#[derive(Clone, Copy, Debug)]
pub struct FlightPlan {
    pub path: PathKind,
    pub start: DVec3,
    /// World units per tick.
    pub speed: f64,
    /// Radians, measured from +x toward +z.
    pub heading: f64,
    /// Height kept above the ground or water surface.
    pub altitude: f64,
    /// Circle radius; ignored for straight paths.
    pub radius: f64,
    pub ticks: u64,
    /// Ticks between progress lines.
    pub report_every: u64,
}

impl FlightPlan {
    /// Horizontal position after `tick` ticks.
    fn ground_track(&self, tick: u64) -> (f64, f64) {
        let t = tick as f64;
        match self.path {
            PathKind::Straight => (
                self.start.x + self.heading.cos() * self.speed * t,
                self.start.z + self.heading.sin() * self.speed * t,
            ),
            PathKind::Circle => {
                let r = self.radius.max(1.0);
                let a = self.heading + self.speed * t / r;
                (
                    self.start.x + r * (a.cos() - self.heading.cos()),
                    self.start.z + r * (a.sin() - self.heading.sin()),
                )
            }
        }
    }
}

/// Stands in for a renderer: counts what it is handed.
#[derive(Default, Debug)]
pub struct FlightSink {
    pub added: u64,
    pub removed: u64,
    pub vertices: u64,
    pub features: u64,
}

impl ChunkSink for FlightSink {
    fn chunk_added(&mut self, chunk: &Chunk) {
        self.added += 1;
        self.vertices += chunk.surface.vertex_count() as u64;
        self.features += chunk.features.len() as u64;
    }

    fn chunk_removed(&mut self, coord: ChunkCoord) {
        log::trace!(target: "app", "released {}", coord);
        self.removed += 1;
    }
}

#[derive(Debug, Default)]
pub struct FlightSummary {
    pub ticks: u64,
    pub distance: f64,
    pub constructions: u64,
    pub peak_resident: usize,
    pub evictions: u64,
    pub discarded: u64,
    pub biomes: Vec<&'static str>,
    pub grazes: u64,
    pub touchdowns: u64,
    pub sample_failures: u64,
    pub terminal: Option<Contact>,
}

pub fn fly(cfg: TerrainConfig, plan: &FlightPlan) -> Result<FlightSummary, RuntimeError> {
    let mut streamer = Streamer::from_config(&cfg)?;
    let field = Arc::new(TerrainField::from_config(&cfg)?);
    let mut store = ChunkStore::with_sink(field, cfg, FlightSink::default())?;

    let texture = wave_texture(WAVE_TEXTURE_SIZE);
    log::info!(
        target: "app",
        "water texture {}x{} ({} bytes)",
        WAVE_TEXTURE_SIZE,
        WAVE_TEXTURE_SIZE,
        texture.len()
    );

    let mut summary = FlightSummary::default();
    let mut seen: HashSet<&'static str> = HashSet::new();
    let mut last_biome: Option<&'static str> = None;
    let mut prev: Option<DVec3> = None;
    let mut grazing = false;

    for tick in 0..plan.ticks {
        let (x, z) = plan.ground_track(tick);
        let field = store.field();
        let surface = f64::from(field.height(x, z).max(field.water_level()));
        let pos = DVec3::new(x, surface + plan.altitude, z);

        let report = streamer.tick(&mut store, pos);
        summary.ticks += 1;
        summary.evictions += report.evicted as u64;
        summary.peak_resident = summary.peak_resident.max(report.resident);
        if let Some(p) = prev {
            summary.distance += (pos - p).length();
        }
        prev = Some(pos);

        let biome = streamer.current_biome(store.field(), pos);
        if last_biome != Some(biome.name) {
            log::info!(target: "app", "[tick {}] entering {} at ({:.0}, {:.0})", report.tick, biome.name, x, z);
            last_biome = Some(biome.name);
            if seen.insert(biome.name) {
                summary.biomes.push(biome.name);
            }
        }

        let contact = probe(store.field(), pos, plan.speed as f32);
        match contact {
            Contact::Grazing { clearance } => {
                if !grazing {
                    log::info!(target: "app", "[tick {}] grazing, clearance {:.1}", report.tick, clearance);
                }
                grazing = true;
                summary.grazes += 1;
            }
            Contact::Touchdown { rest_y } => {
                log::info!(target: "app", "[tick {}] touchdown, settling at y={:.1}", report.tick, rest_y);
                grazing = false;
                summary.touchdowns += 1;
            }
            Contact::Crash | Contact::Ditched => {
                log::warn!(target: "app", "[tick {}] {:?} at ({:.1}, {:.1}, {:.1})", report.tick, contact, x, pos.y, z);
                summary.terminal = Some(contact);
                break;
            }
            Contact::Airborne { .. } => grazing = false,
        }

        if plan.report_every > 0 && report.tick % plan.report_every == 0 {
            let (u, v) = water_offset(&store);
            let (queued, building) = store.queue_counts();
            log::info!(
                target: "app",
                "[tick {}] center {} resident={} in_flight={} (queued={} building={}) clouds={} water=({:.3}, {:.3})",
                report.tick,
                report.center,
                report.resident,
                report.in_flight,
                queued,
                building,
                cloud_positions(&store).len(),
                u,
                v
            );
        }
    }

    summary.constructions = store.constructions();
    summary.discarded = store.discarded();
    summary.sample_failures = store.field().sample_failures();
    let sink = store.sink();
    log::debug!(
        target: "app",
        "sink saw {} added, {} removed, {} vertices, {} features",
        sink.added,
        sink.removed,
        sink.vertices,
        sink.features
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn plan(path: PathKind, ticks: u64) -> FlightPlan {
        FlightPlan {
            path,
            start: DVec3::ZERO,
            speed: 50.0,
            heading: 0.0,
            altitude: 150.0,
            radius: 1000.0,
            ticks,
            report_every: 0,
        }
    }

    fn small_config() -> TerrainConfig {
        let mut cfg = TerrainConfig::default();
        cfg.surface.resolution = 4;
        cfg.stream.view_distance = 1;
        cfg
    }

    #[test]
    fn straight_track_moves_along_heading() {
        let p = plan(PathKind::Straight, 10);
        assert_eq!(p.ground_track(0), (0.0, 0.0));
        let (x, z) = p.ground_track(4);
        assert!((x - 200.0).abs() < 1e-9);
        assert!(z.abs() < 1e-9);
    }

    #[test]
    fn circle_track_starts_at_start_and_returns() {
        let p = plan(PathKind::Circle, 10);
        let (x0, z0) = p.ground_track(0);
        assert!(x0.abs() < 1e-9 && z0.abs() < 1e-9);
        let lap = (TAU * p.radius / p.speed).round() as u64;
        let (x, z) = p.ground_track(lap);
        assert!(x.abs() < 50.0 && z.abs() < 50.0);
    }

    #[test]
    fn high_flight_streams_without_crashing() {
        let summary = fly(small_config(), &plan(PathKind::Straight, 40)).expect("flight");
        assert_eq!(summary.ticks, 40);
        assert!(summary.terminal.is_none());
        assert!(summary.constructions >= 9);
        assert!(summary.evictions > 0);
        assert!(summary.peak_resident <= 16);
        assert!(!summary.biomes.is_empty());
    }
}
