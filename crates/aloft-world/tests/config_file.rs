use std::path::PathBuf;

use aloft_world::config::CloudLayer;
use aloft_world::{TerrainConfig, load_config_from_path};

fn shipped_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/aloft.toml")
}

#[test]
fn shipped_config_matches_defaults() {
    let cfg = load_config_from_path(&shipped_config()).expect("shipped config loads");
    let def = TerrainConfig::default();
    assert_eq!(cfg.seed, def.seed);
    assert_eq!(cfg.stream.chunk_size, def.stream.chunk_size);
    assert_eq!(cfg.stream.view_distance, def.stream.view_distance);
    assert_eq!(cfg.surface.resolution, def.surface.resolution);
    assert_eq!(cfg.height.octaves, def.height.octaves);
    assert_eq!(cfg.biomes.octaves, def.biomes.octaves);
    assert_eq!(cfg.features.buildings.count, def.features.buildings.count);
    assert_eq!(cfg.clouds.low.speed, CloudLayer::low().speed);
    assert_eq!(cfg.clouds.high.altitude, CloudLayer::high().altitude);
}
