use std::f32::consts::TAU;

use aloft_geom::{Rgb, Vec3};
use aloft_world::config::CloudLayer;
use aloft_world::{Biome, ChunkCoord, TerrainConfig, TerrainField};
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Tree,
    House,
    Building,
    Rock,
    Water,
    LowCloud,
    HighCloud,
}

impl FeatureKind {
    #[inline]
    pub fn is_cloud(self) -> bool {
        matches!(self, FeatureKind::LowCloud | FeatureKind::HighCloud)
    }

    /// Minimum height above the water level the ground must have for this
    /// kind to be placed, if it sits on the ground at all.
    pub fn water_buffer(self, cfg: &TerrainConfig) -> Option<f32> {
        let f = &cfg.features;
        match self {
            FeatureKind::Tree => Some(f.trees.water_buffer),
            FeatureKind::House => Some(f.house.water_buffer),
            FeatureKind::Building => Some(f.buildings.water_buffer),
            FeatureKind::Rock => Some(f.rocks.water_buffer),
            FeatureKind::Water | FeatureKind::LowCloud | FeatureKind::HighCloud => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudPuff {
    /// Offset from the group position.
    pub offset: Vec3,
    pub radius: f32,
    pub lightness: f32,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FeatureShape {
    Tree {
        trunk_height: f32,
        canopy_radius: f32,
        canopy_height: f32,
        bark: Rgb,
        leaves: Rgb,
    },
    House {
        width: f32,
        wall_height: f32,
        roof_height: f32,
        wall: Rgb,
        roof: Rgb,
    },
    Building {
        width: f32,
        depth: f32,
        height: f32,
        shade: Rgb,
        window_rows: u32,
    },
    Rock {
        radius: f32,
    },
    Water {
        size: f32,
    },
    Cloud {
        puffs: Vec<CloudPuff>,
        /// Drift direction in radians on the horizontal plane.
        heading: f32,
        /// World units per tick.
        speed: f32,
    },
}

/// A placed feature. `position` is relative to the chunk origin; for
/// ground features its `y` is the terrain height at the anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    pub position: Vec3,
    pub yaw: f32,
    pub scale: f32,
    pub shape: FeatureShape,
}

impl Feature {
    fn grounded(kind: FeatureKind, position: Vec3, yaw: f32, scale: f32, shape: FeatureShape) -> Self {
        Self {
            kind,
            position,
            yaw,
            scale,
            shape,
        }
    }

    /// Horizontal displacement of a cloud group after `ticks` of drift.
    pub fn drift(&self, ticks: u64) -> Vec3 {
        match &self.shape {
            FeatureShape::Cloud { heading, speed, .. } => {
                let d = (ticks as f64 * f64::from(*speed)) as f32;
                Vec3::new(heading.cos() * d, 0.0, heading.sin() * d)
            }
            _ => Vec3::ZERO,
        }
    }
}

const HOUSE_WALL: Rgb = Rgb::from_hex(0xd2691e);
const HOUSE_ROOF: Rgb = Rgb::from_hex(0x8b0000);

struct CloudStyle {
    lightness: [f32; 2],
    opacity: [f32; 2],
}

const LOW_CLOUDS: CloudStyle = CloudStyle {
    lightness: [0.7, 0.9],
    opacity: [0.4, 0.7],
};

const HIGH_CLOUDS: CloudStyle = CloudStyle {
    lightness: [0.85, 0.95],
    opacity: [0.3, 0.5],
};

#[inline]
fn pick<R: Rng + ?Sized>(rng: &mut R, r: [f32; 2]) -> f32 {
    if r[0] >= r[1] { r[0] } else { rng.random_range(r[0]..=r[1]) }
}

#[inline]
fn pick_count<R: Rng + ?Sized>(rng: &mut R, r: [u32; 2]) -> u32 {
    if r[0] >= r[1] { r[0] } else { rng.random_range(r[0]..=r[1]) }
}

#[inline]
fn chance<R: Rng + ?Sized>(rng: &mut R, p: f32) -> bool {
    rng.random_bool(f64::from(p.clamp(0.0, 1.0)))
}

/// Uniform point inside the centered `span` fraction of a chunk edge.
#[inline]
fn central<R: Rng + ?Sized>(rng: &mut R, origin: f64, size: f64, span: f64) -> f64 {
    origin + size * 0.5 + (rng.random::<f64>() - 0.5) * size * span
}

struct Placer<'a> {
    field: &'a TerrainField,
    ox: f64,
    oz: f64,
    water: f32,
}

impl Placer<'_> {
    /// Local anchor on the ground at world `(x, z)` if the ground clears
    /// the water by more than `buffer`.
    fn ground(&self, x: f64, z: f64, buffer: f32) -> Option<Vec3> {
        let y = self.field.height(x, z);
        (y > self.water + buffer).then(|| Vec3::new((x - self.ox) as f32, y, (z - self.oz) as f32))
    }
}

/// Scatters every feature kind over one chunk. `biome` is the chunk-center
/// biome and drives tree density and settlement eligibility.
pub fn scatter_features<R: Rng + ?Sized>(
    field: &TerrainField,
    cfg: &TerrainConfig,
    coord: ChunkCoord,
    biome: &Biome,
    rng: &mut R,
) -> Vec<Feature> {
    let size = cfg.stream.chunk_size;
    let (ox, oz) = coord.origin(size);
    let placer = Placer {
        field,
        ox,
        oz,
        water: field.water_level(),
    };
    let f = &cfg.features;
    let mut out = Vec::new();

    let trees = &f.trees;
    for _ in 0..trees.attempts {
        if !chance(rng, biome.tree_density) {
            continue;
        }
        let x = ox + rng.random::<f64>() * size;
        let z = oz + rng.random::<f64>() * size;
        if let Some(at) = placer.ground(x, z, trees.water_buffer) {
            let scale = pick(rng, trees.scale);
            let shape = FeatureShape::Tree {
                trunk_height: pick(rng, trees.trunk_height),
                canopy_radius: pick(rng, trees.canopy_radius),
                canopy_height: pick(rng, trees.canopy_height),
                bark: Rgb::from_hsl(0.08, 0.5, pick(rng, [0.2, 0.3])),
                leaves: Rgb::from_hsl(pick(rng, trees.leaf_hue), 0.7, pick(rng, [0.3, 0.5])),
            };
            let yaw = rng.random::<f32>() * TAU;
            out.push(Feature::grounded(FeatureKind::Tree, at, yaw, scale, shape));
        }
    }

    let house = &f.house;
    if chance(rng, house.chance) {
        let x = central(rng, ox, size, house.span);
        let z = central(rng, oz, size, house.span);
        if let Some(at) = placer.ground(x, z, house.water_buffer) {
            let shape = FeatureShape::House {
                width: 8.0,
                wall_height: 6.0,
                roof_height: 4.0,
                wall: HOUSE_WALL,
                roof: HOUSE_ROOF,
            };
            out.push(Feature::grounded(FeatureKind::House, at, 0.0, 1.0, shape));
        }
    }

    let blds = &f.buildings;
    if biome.allows_settlements() && chance(rng, blds.chance) {
        let count = pick_count(rng, blds.count);
        let cx = central(rng, ox, size, blds.center_span);
        let cz = central(rng, oz, size, blds.center_span);
        for _ in 0..count {
            let angle = rng.random::<f64>() * std::f64::consts::TAU;
            let dist = rng.random::<f64>() * blds.radius;
            let x = cx + angle.cos() * dist;
            let z = cz + angle.sin() * dist;
            let width = pick(rng, blds.footprint);
            let depth = pick(rng, blds.footprint);
            let height = pick(rng, blds.height);
            let shade = Rgb::grey(pick(rng, [0.4, 0.7]));
            let yaw = rng.random::<f32>() * TAU;
            if let Some(at) = placer.ground(x, z, blds.water_buffer) {
                let shape = FeatureShape::Building {
                    width,
                    depth,
                    height,
                    shade,
                    window_rows: (height / blds.window_spacing).floor() as u32,
                };
                out.push(Feature::grounded(FeatureKind::Building, at, yaw, 1.0, shape));
            }
        }
    }

    let rocks = &f.rocks;
    for _ in 0..rocks.attempts {
        if !chance(rng, rocks.chance) {
            continue;
        }
        let x = ox + rng.random::<f64>() * size;
        let z = oz + rng.random::<f64>() * size;
        if let Some(at) = placer.ground(x, z, rocks.water_buffer) {
            let shape = FeatureShape::Rock {
                radius: pick(rng, rocks.radius),
            };
            let yaw = rng.random::<f32>() * TAU;
            out.push(Feature::grounded(FeatureKind::Rock, at, yaw, 1.0, shape));
        }
    }

    let half = (size * 0.5) as f32;
    out.push(Feature::grounded(
        FeatureKind::Water,
        Vec3::new(half, placer.water, half),
        0.0,
        1.0,
        FeatureShape::Water { size: size as f32 },
    ));

    scatter_clouds(rng, &mut out, FeatureKind::LowCloud, &cfg.clouds.low, &LOW_CLOUDS, size);
    scatter_clouds(rng, &mut out, FeatureKind::HighCloud, &cfg.clouds.high, &HIGH_CLOUDS, size);
    out
}

fn scatter_clouds<R: Rng + ?Sized>(
    rng: &mut R,
    out: &mut Vec<Feature>,
    kind: FeatureKind,
    layer: &CloudLayer,
    style: &CloudStyle,
    size: f64,
) {
    let attempts = pick_count(rng, layer.attempts);
    for _ in 0..attempts {
        if !chance(rng, layer.chance) {
            continue;
        }
        let n = pick_count(rng, layer.puffs);
        let mut puffs = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let cluster = pick(rng, layer.cluster);
            let angle = rng.random::<f32>() * TAU;
            let reach = cluster * rng.random::<f32>();
            puffs.push(CloudPuff {
                offset: Vec3::new(
                    angle.cos() * reach,
                    (rng.random::<f32>() - 0.5) * layer.puff_jitter,
                    angle.sin() * reach,
                ),
                radius: pick(rng, layer.puff_radius),
                lightness: pick(rng, style.lightness),
                opacity: pick(rng, style.opacity),
            });
        }
        let position = Vec3::new(
            (rng.random::<f64>() * size) as f32,
            pick(rng, layer.altitude),
            (rng.random::<f64>() * size) as f32,
        );
        out.push(Feature {
            kind,
            position,
            yaw: 0.0,
            scale: 1.0,
            shape: FeatureShape::Cloud {
                puffs,
                heading: rng.random::<f32>() * TAU,
                speed: pick(rng, layer.speed),
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn ranges_collapse_to_min_when_degenerate() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick(&mut rng, [3.0, 3.0]), 3.0);
        assert_eq!(pick_count(&mut rng, [4, 4]), 4);
        let v = pick(&mut rng, [1.0, 2.0]);
        assert!((1.0..=2.0).contains(&v));
    }

    #[test]
    fn central_stays_in_span() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1000 {
            let x = central(&mut rng, 400.0, 400.0, 0.5);
            assert!((500.0..=700.0).contains(&x));
        }
    }

    #[test]
    fn cloud_drift_follows_heading() {
        let cloud = Feature {
            kind: FeatureKind::LowCloud,
            position: Vec3::new(0.0, 350.0, 0.0),
            yaw: 0.0,
            scale: 1.0,
            shape: FeatureShape::Cloud {
                puffs: Vec::new(),
                heading: 0.0,
                speed: 0.25,
            },
        };
        assert_eq!(cloud.drift(0), Vec3::ZERO);
        let d = cloud.drift(100);
        assert!((d.x - 25.0).abs() < 1e-4);
        assert!(d.z.abs() < 1e-4);
    }
}
