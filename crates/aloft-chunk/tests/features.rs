use std::sync::Arc;

use aloft_chunk::{ChunkBuilder, FeatureKind, FeatureShape};
use aloft_world::{ChunkCoord, TerrainConfig, TerrainField};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn builder(cfg: TerrainConfig) -> ChunkBuilder {
    let field = Arc::new(TerrainField::from_config(&cfg).expect("field"));
    ChunkBuilder::new(field, Arc::new(cfg))
}

#[test]
fn ground_features_clear_the_water() {
    let cfg = TerrainConfig::default();
    let b = builder(cfg.clone());
    let water = b.field().water_level();
    let mut rng = StdRng::seed_from_u64(0xA10F7);
    let mut placed = 0usize;
    for cx in -4..4 {
        for cz in -4..4 {
            let chunk = b.build(ChunkCoord::new(cx, cz), &mut rng, 0);
            for f in &chunk.features {
                if let Some(buffer) = f.kind.water_buffer(&cfg) {
                    assert!(f.position.y > water + buffer, "{:?} at {:?}", f.kind, f.position);
                    let world = chunk.world_position(f.position);
                    assert!((b.field().height(world.x, world.z) - f.position.y).abs() < 0.1);
                    placed += 1;
                }
            }
        }
    }
    assert!(placed > 0);
}

#[test]
fn every_chunk_has_one_water_plane() {
    let b = builder(TerrainConfig::default());
    let mut rng = StdRng::seed_from_u64(3);
    let chunk = b.build(ChunkCoord::new(7, -2), &mut rng, 5);
    assert_eq!(chunk.count(FeatureKind::Water), 1);
    let water = chunk.features_of(FeatureKind::Water).next().expect("water");
    assert_eq!(water.position.y, -20.0);
    assert_eq!(water.shape, FeatureShape::Water { size: 400.0 });
    assert_eq!(chunk.created_tick, 5);
}

#[test]
fn cloud_groups_follow_layer_rules() {
    let cfg = TerrainConfig::default();
    let b = builder(cfg.clone());
    let mut rng = StdRng::seed_from_u64(77);
    let mut seen = 0;
    for i in 0..20 {
        let chunk = b.build(ChunkCoord::new(i, i), &mut rng, 0);
        assert!(chunk.count(FeatureKind::LowCloud) <= 3);
        assert!(chunk.count(FeatureKind::HighCloud) <= 5);
        for f in chunk.features.iter().filter(|f| f.kind.is_cloud()) {
            let layer = if f.kind == FeatureKind::LowCloud { &cfg.clouds.low } else { &cfg.clouds.high };
            assert!(f.position.y >= layer.altitude[0] && f.position.y <= layer.altitude[1]);
            let FeatureShape::Cloud { puffs, speed, .. } = &f.shape else {
                panic!("cloud without cloud shape");
            };
            assert!((layer.puffs[0] as usize..=layer.puffs[1] as usize).contains(&puffs.len()));
            assert!(*speed >= layer.speed[0] && *speed <= layer.speed[1]);
            for p in puffs {
                assert!(p.radius >= layer.puff_radius[0] && p.radius <= layer.puff_radius[1]);
            }
            seen += 1;
        }
    }
    assert!(seen > 0);
}

#[test]
fn buildings_only_in_settlement_biomes() {
    let mut cfg = TerrainConfig::default();
    cfg.features.buildings.chance = 1.0;
    let b = builder(cfg);
    let mut rng = StdRng::seed_from_u64(11);
    for i in -30..30 {
        let chunk = b.build(ChunkCoord::new(i * 37, -i * 23), &mut rng, 0);
        if chunk.count(FeatureKind::Building) > 0 {
            assert!(chunk.biome.allows_settlements());
        }
        for f in chunk.features_of(FeatureKind::Building) {
            let FeatureShape::Building { height, window_rows, width, .. } = f.shape else {
                panic!("building without building shape");
            };
            assert_eq!(window_rows, (height / 4.0).floor() as u32);
            assert!((12.0..=28.0).contains(&width));
        }
    }
}

#[test]
fn flat_world_chunk_is_single_biome() {
    let cfg = TerrainConfig::default();
    let field = Arc::new(TerrainField::with_noise(None, &cfg).expect("field"));
    let b = ChunkBuilder::new(field, Arc::new(cfg));
    let mut rng = StdRng::seed_from_u64(1);
    let chunk = b.build(ChunkCoord::new(0, 0), &mut rng, 0);
    assert_eq!(chunk.biome.name, "Forest");
    let c0 = chunk.surface.color(0, 0);
    assert!(chunk.surface.pos.chunks_exact(3).all(|p| p[1] == 0.0));
    assert!(chunk.surface.col.chunks_exact(3).all(|c| c == c0.to_array()));
    // Height 0 clears water -20 by more than every buffer.
    assert!(chunk.count(FeatureKind::Water) == 1);
}

#[test]
fn same_scatter_seed_same_chunk() {
    let b = builder(TerrainConfig::default());
    let a = b.build(ChunkCoord::new(2, 3), &mut StdRng::seed_from_u64(5), 0);
    let c = b.build(ChunkCoord::new(2, 3), &mut StdRng::seed_from_u64(5), 0);
    assert_eq!(a.features, c.features);
    assert_eq!(a.surface.pos, c.surface.pos);
}
