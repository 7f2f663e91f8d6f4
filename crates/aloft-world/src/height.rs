use std::sync::Arc;

use crate::noise::{FailureCounter, NoiseField, Octave, SampleError, fractal};

/// Continent-scale hills.
pub const MACRO: Octave = Octave::new(0.0008, 200.0);
/// Mountain complexity layered over the macro octave.
pub const SECONDARY_MACRO: Octave = Octave::new(0.0012, 120.0);
/// Surface roughness, coarse to fine.
pub const MICRO: [Octave; 3] = [
    Octave::new(0.01, 25.0),
    Octave::new(0.03, 12.0),
    Octave::new(0.08, 6.0),
];

/// Reference octave stack, tuned by eye.
pub const DEFAULT_HEIGHT_OCTAVES: [Octave; 5] =
    [MACRO, SECONDARY_MACRO, MICRO[0], MICRO[1], MICRO[2]];

/// World elevation as a fractal sum of noise octaves.
pub struct HeightField {
    noise: Option<Arc<dyn NoiseField>>,
    octaves: Vec<Octave>,
    failures: FailureCounter,
}

impl HeightField {
    pub fn new(noise: Option<Arc<dyn NoiseField>>, octaves: Vec<Octave>) -> Self {
        Self {
            noise,
            octaves,
            failures: FailureCounter::new("height"),
        }
    }

    /// Elevation at `(x, z)`; a failed sample degrades to `0`.
    pub fn height(&self, x: f64, z: f64) -> f32 {
        if self.noise.is_none() {
            return 0.0;
        }
        match self.try_height(x, z) {
            Ok(h) => h,
            Err(err) => {
                self.failures.record(&err, x, z);
                0.0
            }
        }
    }

    pub fn try_height(&self, x: f64, z: f64) -> Result<f32, SampleError> {
        let noise = self.noise.as_deref().ok_or(SampleError::Unavailable)?;
        fractal(noise, &self.octaves, x, z)
    }

    /// Largest possible deviation from zero.
    pub fn amplitude_bound(&self) -> f32 {
        self.octaves.iter().map(|o| o.amplitude.abs()).sum()
    }

    #[inline]
    pub fn octaves(&self) -> &[Octave] {
        &self.octaves
    }

    #[inline]
    pub fn failures(&self) -> u64 {
        self.failures.count()
    }
}
