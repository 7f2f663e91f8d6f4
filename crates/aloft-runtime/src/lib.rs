//! Chunk residency, streaming and background chunk builds.
#![forbid(unsafe_code)]

mod effects;
mod events;
mod store;
mod streaming;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use aloft_chunk::{Chunk, ChunkBuilder};
use aloft_world::{ChunkCoord, ConfigError};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;

pub use effects::{CloudSnapshot, cloud_positions, cloud_world_position, water_offset};
pub use events::{ChunkEvent, ChunkSink, EventLog};
pub use store::{ChunkStore, EnsureOutcome};
pub use streaming::{Streamer, TickReport};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start build workers: {0}")]
    Pool(#[from] ThreadPoolBuildError),
}

#[derive(Clone, Debug)]
pub struct BuildJob {
    pub coord: ChunkCoord,
    pub job_id: u64,
    pub tick: u64,
    pub rng_seed: u64,
    pub cancel: Arc<AtomicBool>,
}

pub struct JobOut {
    pub coord: ChunkCoord,
    pub job_id: u64,
    /// `None` when the job was cancelled before or during the build.
    pub chunk: Option<Chunk>,
    pub t_build_ms: u32,
}

fn process_build_job(job: BuildJob, builder: &ChunkBuilder) -> JobOut {
    let BuildJob {
        coord,
        job_id,
        tick,
        rng_seed,
        cancel,
    } = job;
    let t0 = Instant::now();
    let chunk = if cancel.load(Ordering::Acquire) {
        None
    } else {
        let mut rng = StdRng::seed_from_u64(rng_seed);
        let built = builder.build(coord, &mut rng, tick);
        (!cancel.load(Ordering::Acquire)).then_some(built)
    };
    let t_build_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    JobOut {
        coord,
        job_id,
        chunk,
        t_build_ms,
    }
}

/// Background chunk builders fed through an unbounded job queue.
pub struct GenRuntime {
    job_tx: Sender<BuildJob>,
    res_rx: Receiver<JobOut>,
    _pool: Arc<ThreadPool>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    pub workers: usize,
}

impl GenRuntime {
    pub fn new(builder: ChunkBuilder, workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<BuildJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();
        let queued = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("aloft-build-{i}"))
                .build()?,
        );
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let builder = builder.clone();
            let queued = queued.clone();
            let inflight = inflight.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    queued.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    let out = process_build_job(job, &builder);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                    let (coord, job_id) = (out.coord, out.job_id);
                    if tx.send(out).is_err() {
                        log::trace!(target: "runtime", "result channel closed; dropped build {} for {}", job_id, coord);
                    }
                }
            });
        }
        log::info!(target: "runtime", "started {} build worker(s)", workers);
        Ok(Self {
            job_tx,
            res_rx,
            _pool: pool,
            queued,
            inflight,
            workers,
        })
    }

    /// Queues a build; returns `false` if the workers are gone.
    pub fn submit(&self, job: BuildJob) -> bool {
        self.queued.fetch_add(1, Ordering::Relaxed);
        if self.job_tx.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    pub fn drain_worker_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    /// Blocks for the next result, up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<JobOut> {
        match self.res_rx.recv_timeout(timeout) {
            Ok(out) => Some(out),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// `(queued, building)`
    pub fn queue_debug_counts(&self) -> (usize, usize) {
        (
            self.queued.load(Ordering::Relaxed),
            self.inflight.load(Ordering::Relaxed),
        )
    }
}
