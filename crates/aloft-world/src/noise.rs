use std::sync::atomic::{AtomicU64, Ordering};

use fastnoise_lite::{FastNoiseLite, NoiseType};
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SampleError {
    #[error("non-finite sample coordinate ({x}, {z})")]
    Coordinate { x: f64, z: f64 },
    #[error("noise source produced {value} at ({x}, {z})")]
    Output { x: f64, z: f64, value: f32 },
    #[error("noise source unavailable")]
    Unavailable,
}

/// Deterministic continuous 2D scalar field in roughly `[-1, 1]`.
///
/// Implementations must be pure: adjacent chunks sample the same world
/// coordinates independently and rely on identical answers.
pub trait NoiseField: Send + Sync {
    fn sample(&self, x: f64, z: f64) -> Result<f32, SampleError>;
}

/// OpenSimplex2 field seeded once at construction.
///
/// The generator runs at frequency 1; octave frequencies are applied in
/// `f64` by callers so far-away world coordinates are scaled down before
/// they are narrowed to the generator's `f32` input.
/// Generator inputs are clamped to `±INPUT_LIMIT`. Past it `f32` spacing
/// exceeds 64 units and the generator's lattice floor would overflow.
pub const INPUT_LIMIT: f64 = 1.0e9;

pub struct SimplexField {
    seed: i32,
    noise: FastNoiseLite,
}

impl SimplexField {
    pub fn new(seed: i32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(1.0));
        Self { seed, noise }
    }

    #[inline]
    pub fn seed(&self) -> i32 {
        self.seed
    }
}

impl NoiseField for SimplexField {
    fn sample(&self, x: f64, z: f64) -> Result<f32, SampleError> {
        if !x.is_finite() || !z.is_finite() {
            return Err(SampleError::Coordinate { x, z });
        }
        let (x, z) = (x.clamp(-INPUT_LIMIT, INPUT_LIMIT), z.clamp(-INPUT_LIMIT, INPUT_LIMIT));
        let value = self.noise.get_noise_2d(x as f32, z as f32);
        if !value.is_finite() {
            return Err(SampleError::Output { x, z, value });
        }
        Ok(value)
    }
}

/// One frequency/amplitude pair of a fractal sum.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct Octave {
    pub frequency: f64,
    pub amplitude: f32,
}

impl Octave {
    #[inline]
    pub const fn new(frequency: f64, amplitude: f32) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }
}

/// Weighted sum of `octaves`; the first failing octave aborts the sum.
pub(crate) fn fractal(
    noise: &dyn NoiseField,
    octaves: &[Octave],
    x: f64,
    z: f64,
) -> Result<f32, SampleError> {
    let mut sum = 0.0_f32;
    for o in octaves {
        sum += noise.sample(x * o.frequency, z * o.frequency)? * o.amplitude;
    }
    Ok(sum)
}

/// Counts recovered sampling failures; warns once, then drops to debug.
pub(crate) struct FailureCounter {
    label: &'static str,
    count: AtomicU64,
}

impl FailureCounter {
    pub(crate) const fn new(label: &'static str) -> Self {
        Self {
            label,
            count: AtomicU64::new(0),
        }
    }

    pub(crate) fn record(&self, err: &SampleError, x: f64, z: f64) {
        let prev = self.count.fetch_add(1, Ordering::Relaxed);
        if prev == 0 {
            log::warn!(
                target: "terrain",
                "{} sampling failed at ({:.2}, {:.2}): {}; using fallback",
                self.label,
                x,
                z,
                err
            );
        } else {
            log::debug!(target: "terrain", "{} sampling failed at ({:.2}, {:.2}): {}", self.label, x, z, err);
        }
    }

    #[inline]
    pub(crate) fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
