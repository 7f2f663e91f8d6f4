use std::sync::Arc;

use aloft_geom::Rgb;

use crate::noise::{FailureCounter, NoiseField, Octave, SampleError, fractal};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BiomeKind {
    Forest,
    Desert,
    Mountains,
    Plains,
    Tundra,
    Swamp,
    Canyon,
    Volcanic,
    Coastal,
    Jungle,
}

#[derive(Debug, PartialEq)]
pub struct Biome {
    pub kind: BiomeKind,
    pub name: &'static str,
    pub color: Rgb,
    /// Per-attempt probability that a tree is placed.
    pub tree_density: f32,
}

impl Biome {
    const fn new(kind: BiomeKind, name: &'static str, hex: u32, tree_density: f32) -> Self {
        Self {
            kind,
            name,
            color: Rgb::from_hex(hex),
            tree_density,
        }
    }

    /// Building clusters only spawn in open, flat biomes.
    #[inline]
    pub fn allows_settlements(&self) -> bool {
        matches!(self.kind, BiomeKind::Plains | BiomeKind::Coastal)
    }
}

/// Ordered catalog indexed by the classifier scalar.
pub static BIOMES: [Biome; 10] = [
    Biome::new(BiomeKind::Forest, "Forest", 0x2d5a27, 0.8),
    Biome::new(BiomeKind::Desert, "Desert", 0xc2b280, 0.1),
    Biome::new(BiomeKind::Mountains, "Mountains", 0x8b7355, 0.25),
    Biome::new(BiomeKind::Plains, "Plains", 0x7cfc00, 0.4),
    Biome::new(BiomeKind::Tundra, "Tundra", 0xf0f8ff, 0.08),
    Biome::new(BiomeKind::Swamp, "Swamp", 0x2f4f2f, 0.75),
    Biome::new(BiomeKind::Canyon, "Canyon", 0xcd853f, 0.12),
    Biome::new(BiomeKind::Volcanic, "Volcanic", 0x8b0000, 0.03),
    Biome::new(BiomeKind::Coastal, "Coastal", 0x87ceeb, 0.45),
    Biome::new(BiomeKind::Jungle, "Jungle", 0x228b22, 0.9),
];

pub const DEFAULT_BIOME_INDEX: usize = 0;

#[inline]
pub fn default_biome() -> &'static Biome {
    &BIOMES[DEFAULT_BIOME_INDEX]
}

/// Very low frequencies: biome regions span hundreds to thousands of units.
pub const DEFAULT_BIOME_OCTAVES: [Octave; 3] = [
    Octave::new(0.00005, 1.0),
    Octave::new(0.0002, 0.4),
    Octave::new(0.0005, 0.2),
];

/// Maps a classifier scalar onto a catalog slot: `(s + 1) / 2` spread
/// linearly over `len` entries, clamped.
pub fn index_for_scalar(s: f32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let slot = ((s + 1.0) * 0.5 * len as f32).floor();
    if slot.is_nan() || slot <= 0.0 {
        return 0;
    }
    (slot as usize).min(len - 1)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendParams {
    /// Offset of the four orthogonal neighbour samples.
    pub distance: f64,
    pub center_weight: f32,
    pub neighbor_weight: f32,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self {
            distance: 20.0,
            center_weight: 1.0,
            neighbor_weight: 0.3,
        }
    }
}

pub struct BiomeClassifier {
    noise: Option<Arc<dyn NoiseField>>,
    octaves: Vec<Octave>,
    blend: BlendParams,
    failures: FailureCounter,
}

impl BiomeClassifier {
    pub fn new(noise: Option<Arc<dyn NoiseField>>, octaves: Vec<Octave>, blend: BlendParams) -> Self {
        Self {
            noise,
            octaves,
            blend,
            failures: FailureCounter::new("biome"),
        }
    }

    pub fn try_index(&self, x: f64, z: f64) -> Result<usize, SampleError> {
        let noise = self.noise.as_deref().ok_or(SampleError::Unavailable)?;
        let s = fractal(noise, &self.octaves, x, z)?;
        Ok(index_for_scalar(s, BIOMES.len()))
    }

    /// Catalog slot at `(x, z)`; failures fall back to the default biome.
    pub fn index_at(&self, x: f64, z: f64) -> usize {
        if self.noise.is_none() {
            return DEFAULT_BIOME_INDEX;
        }
        match self.try_index(x, z) {
            Ok(idx) => idx,
            Err(err) => {
                self.failures.record(&err, x, z);
                DEFAULT_BIOME_INDEX
            }
        }
    }

    #[inline]
    pub fn classify(&self, x: f64, z: f64) -> &'static Biome {
        &BIOMES[self.index_at(x, z)]
    }

    /// Weighted average of the biome colors at the point and its four
    /// orthogonal neighbours, which softens hard region borders.
    ///
    /// The result is clamped per channel into the range spanned by the
    /// sampled colors so rounding never pushes it outside their hull.
    pub fn blended_color(&self, x: f64, z: f64) -> Rgb {
        if self.noise.is_none() {
            return default_biome().color;
        }
        let d = self.blend.distance;
        let samples = [
            (x, z, self.blend.center_weight),
            (x + d, z, self.blend.neighbor_weight),
            (x - d, z, self.blend.neighbor_weight),
            (x, z + d, self.blend.neighbor_weight),
            (x, z - d, self.blend.neighbor_weight),
        ];
        let mut total = Rgb::BLACK;
        let mut total_weight = 0.0_f32;
        let mut lo = Rgb::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut hi = Rgb::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (sx, sz, w) in samples {
            let color = self.classify(sx, sz).color;
            total = total + color * w;
            total_weight += w;
            lo = lo.min_channels(color);
            hi = hi.max_channels(color);
        }
        if total_weight <= 0.0 {
            return self.classify(x, z).color;
        }
        (total / total_weight).clamp_channels(lo, hi)
    }

    #[inline]
    pub fn blend(&self) -> BlendParams {
        self.blend
    }

    #[inline]
    pub fn failures(&self) -> u64 {
        self.failures.count()
    }
}
