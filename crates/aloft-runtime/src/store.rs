use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use aloft_chunk::{Chunk, ChunkBuilder};
use aloft_world::{ChunkCoord, TerrainConfig, TerrainField};
use hashbrown::HashMap;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::events::{ChunkSink, EventLog};
use crate::{BuildJob, GenRuntime, JobOut, RuntimeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnsureOutcome {
    AlreadyResident,
    AlreadyInFlight,
    Built,
    Queued,
}

struct InFlight {
    job_id: u64,
    cancel: Arc<AtomicBool>,
}

/// Owns every resident chunk. At most one chunk or pending build exists
/// per key.
pub struct ChunkStore<S: ChunkSink = EventLog> {
    builder: ChunkBuilder,
    resident: HashMap<ChunkCoord, Chunk>,
    inflight: HashMap<ChunkCoord, InFlight>,
    runtime: Option<GenRuntime>,
    sink: S,
    clock: u64,
    next_job_id: u64,
    build_seq: u64,
    scatter_seed: Option<u64>,
    constructions: u64,
    discarded: u64,
}

impl ChunkStore<EventLog> {
    pub fn new(cfg: TerrainConfig) -> Result<Self, RuntimeError> {
        let field = Arc::new(TerrainField::from_config(&cfg)?);
        Self::with_sink(field, cfg, EventLog::default())
    }
}

impl<S: ChunkSink> ChunkStore<S> {
    pub fn with_sink(field: Arc<TerrainField>, cfg: TerrainConfig, sink: S) -> Result<Self, RuntimeError> {
        cfg.validate()?;
        let workers = cfg.runtime.workers;
        let scatter_seed = cfg.runtime.scatter_seed;
        let builder = ChunkBuilder::new(field, Arc::new(cfg));
        let runtime = if workers > 0 {
            Some(GenRuntime::new(builder.clone(), workers)?)
        } else {
            None
        };
        Ok(Self {
            builder,
            resident: HashMap::new(),
            inflight: HashMap::new(),
            runtime,
            sink,
            clock: 0,
            next_job_id: 1,
            build_seq: 0,
            scatter_seed,
            constructions: 0,
            discarded: 0,
        })
    }

    /// Scatter seed for the next build. Regenerating an evicted key uses a
    /// fresh seed, so it looks different unless a fixed seed is configured
    /// and the build order repeats.
    fn next_scatter_seed(&mut self) -> u64 {
        let seq = self.build_seq;
        self.build_seq += 1;
        match self.scatter_seed {
            Some(seed) => seed.wrapping_add(seq << 32).wrapping_add(seq),
            None => rand::random(),
        }
    }

    pub fn ensure_chunk(&mut self, cx: i32, cz: i32) -> EnsureOutcome {
        let coord = ChunkCoord::new(cx, cz);
        if self.resident.contains_key(&coord) {
            return EnsureOutcome::AlreadyResident;
        }
        if self.inflight.contains_key(&coord) {
            return EnsureOutcome::AlreadyInFlight;
        }
        let seed = self.next_scatter_seed();
        if let Some(rt) = &self.runtime {
            let job_id = self.next_job_id;
            self.next_job_id += 1;
            let cancel = Arc::new(AtomicBool::new(false));
            let job = BuildJob {
                coord,
                job_id,
                tick: self.clock,
                rng_seed: seed,
                cancel: cancel.clone(),
            };
            if rt.submit(job) {
                self.inflight.insert(coord, InFlight { job_id, cancel });
                return EnsureOutcome::Queued;
            }
            log::warn!(target: "stream", "build workers unavailable; building {} inline", coord);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let chunk = self.builder.build(coord, &mut rng, self.clock);
        self.install(chunk);
        EnsureOutcome::Built
    }

    fn install(&mut self, chunk: Chunk) {
        self.constructions += 1;
        self.sink.chunk_added(&chunk);
        self.resident.insert(chunk.coord, chunk);
    }

    /// Drops the chunk at `(cx, cz)` or cancels its pending build. Returns
    /// whether anything was there.
    pub fn evict_chunk(&mut self, cx: i32, cz: i32) -> bool {
        let coord = ChunkCoord::new(cx, cz);
        if let Some(pending) = self.inflight.remove(&coord) {
            pending.cancel.store(true, Ordering::Release);
            log::debug!(target: "stream", "cancelled build {} for {}", pending.job_id, coord);
            return true;
        }
        match self.resident.remove(&coord) {
            Some(chunk) => {
                self.sink.chunk_removed(coord);
                drop(chunk);
                true
            }
            None => false,
        }
    }

    fn accept(&mut self, out: JobOut) -> bool {
        let current = self
            .inflight
            .get(&out.coord)
            .is_some_and(|p| p.job_id == out.job_id);
        if !current {
            self.discarded += 1;
            log::debug!(target: "stream", "discarding stale build {} for {}", out.job_id, out.coord);
            return false;
        }
        self.inflight.remove(&out.coord);
        match out.chunk {
            Some(chunk) => {
                log::trace!(target: "stream", "installed {} ({} ms)", out.coord, out.t_build_ms);
                self.install(chunk);
                true
            }
            None => false,
        }
    }

    /// Installs every finished background build. Returns how many landed.
    pub fn pump(&mut self) -> usize {
        let results = match &self.runtime {
            Some(rt) => rt.drain_worker_results(),
            None => return 0,
        };
        let mut installed = 0;
        for out in results {
            installed += usize::from(self.accept(out));
        }
        installed
    }

    /// Waits until no builds are pending or `timeout` passes.
    pub fn flush(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut installed = 0;
        while !self.inflight.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                log::warn!(target: "stream", "flush timed out with {} build(s) pending", self.inflight.len());
                break;
            }
            let next = match &self.runtime {
                Some(rt) => rt.recv_timeout(deadline - now),
                None => break,
            };
            match next {
                Some(out) => installed += usize::from(self.accept(out)),
                None => break,
            }
        }
        installed
    }

    pub fn for_each_resident(&self, mut f: impl FnMut(&Chunk)) {
        for chunk in self.resident.values() {
            f(chunk);
        }
    }

    pub fn resident_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.resident.keys().copied().collect();
        coords.sort();
        coords
    }

    pub fn in_flight_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.inflight.keys().copied().collect();
        coords.sort();
        coords
    }

    /// Advances the logical clock by one tick.
    pub fn advance_clock(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    #[inline]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    #[inline]
    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.resident.get(&coord)
    }

    #[inline]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.resident.contains_key(&coord)
    }

    #[inline]
    pub fn is_in_flight(&self, coord: ChunkCoord) -> bool {
        self.inflight.contains_key(&coord)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.resident.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    #[inline]
    pub fn in_flight_len(&self) -> usize {
        self.inflight.len()
    }

    /// Chunks built and installed since creation.
    #[inline]
    pub fn constructions(&self) -> u64 {
        self.constructions
    }

    /// Worker results dropped because their key was evicted or re-requested.
    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn field(&self) -> &TerrainField {
        self.builder.field()
    }

    #[inline]
    pub fn config(&self) -> &TerrainConfig {
        self.builder.config()
    }

    /// `(queued, building)` on the worker pool; zero without workers.
    pub fn queue_counts(&self) -> (usize, usize) {
        self.runtime.as_ref().map_or((0, 0), GenRuntime::queue_debug_counts)
    }
}

impl<S: ChunkSink> Drop for ChunkStore<S> {
    fn drop(&mut self) {
        for pending in self.inflight.values() {
            pending.cancel.store(true, Ordering::Release);
        }
    }
}
