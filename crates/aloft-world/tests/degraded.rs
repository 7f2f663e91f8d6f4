use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aloft_world::biome::default_biome;
use aloft_world::{NoiseField, SampleError, TerrainConfig, TerrainField};

struct BrokenNoise;

impl NoiseField for BrokenNoise {
    fn sample(&self, x: f64, z: f64) -> Result<f32, SampleError> {
        Err(SampleError::Output { x, z, value: f32::NAN })
    }
}

// Works until tripped.
struct FlakyNoise {
    tripped: AtomicBool,
}

impl NoiseField for FlakyNoise {
    fn sample(&self, x: f64, z: f64) -> Result<f32, SampleError> {
        if self.tripped.load(Ordering::Relaxed) {
            Err(SampleError::Unavailable)
        } else {
            Ok(((x * 0.5).sin() * (z * 0.5).cos()) as f32)
        }
    }
}

#[test]
fn missing_noise_yields_flat_default_world() {
    let field = TerrainField::with_noise(None, &TerrainConfig::default()).expect("field");
    for &(x, z) in &[(0.0, 0.0), (1234.5, -99.0), (-1.0e6, 3.0e5)] {
        assert_eq!(field.height(x, z), 0.0);
        assert_eq!(field.biome(x, z).name, default_biome().name);
        assert_eq!(field.blended_color(x, z), default_biome().color);
    }
    assert_eq!(field.sample_failures(), 0);
}

#[test]
fn failing_noise_degrades_and_counts() {
    let noise: Arc<dyn NoiseField> = Arc::new(BrokenNoise);
    let field = TerrainField::with_noise(Some(noise), &TerrainConfig::default()).expect("field");
    assert_eq!(field.height(10.0, 20.0), 0.0);
    assert_eq!(field.biome(10.0, 20.0).name, "Forest");
    assert_eq!(field.heights().failures(), 1);
    assert!(field.biomes().failures() >= 1);
}

#[test]
fn failure_mid_session_only_affects_later_samples() {
    let flaky = Arc::new(FlakyNoise {
        tripped: AtomicBool::new(false),
    });
    let noise: Arc<dyn NoiseField> = flaky.clone();
    let field = TerrainField::with_noise(Some(noise), &TerrainConfig::default()).expect("field");
    let before = field.height(300.0, 300.0);
    assert!(field.heights().try_height(300.0, 300.0).is_ok());
    flaky.tripped.store(true, Ordering::Relaxed);
    assert_eq!(field.height(300.0, 300.0), 0.0);
    assert!(field.heights().try_height(300.0, 300.0).is_err());
    flaky.tripped.store(false, Ordering::Relaxed);
    assert_eq!(field.height(300.0, 300.0), before);
}

#[test]
fn non_finite_coordinates_fall_back() {
    let field = TerrainField::from_config(&TerrainConfig::default()).expect("field");
    assert_eq!(field.height(f64::NAN, 0.0), 0.0);
    assert_eq!(field.heights().failures(), 1);
}
