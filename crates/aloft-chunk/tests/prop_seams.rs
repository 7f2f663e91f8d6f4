use std::sync::Arc;

use aloft_chunk::{SurfaceMesh, build_surface};
use aloft_world::{ChunkCoord, TerrainConfig, TerrainField};
use proptest::prelude::*;

fn field() -> Arc<TerrainField> {
    Arc::new(TerrainField::from_config(&TerrainConfig::default()).expect("field"))
}

// Compares the shared edge of two chunks; `east` picks the x edge, else z.
fn assert_shared_edge(a: &SurfaceMesh, b: &SurfaceMesh, east: bool) -> Result<(), TestCaseError> {
    let last = a.side() - 1;
    for i in 0..a.side() {
        let (ai, bi) = if east { ((last, i), (0, i)) } else { ((i, last), (i, 0)) };
        prop_assert_eq!(a.height(ai.0, ai.1).to_bits(), b.height(bi.0, bi.1).to_bits());
        prop_assert_eq!(a.color(ai.0, ai.1), b.color(bi.0, bi.1));
        prop_assert_eq!(a.normal(ai.0, ai.1), b.normal(bi.0, bi.1));
    }
    Ok(())
}

#[test]
fn default_chunks_share_edges_exactly() {
    let f = field();
    let a = build_surface(&f, ChunkCoord::new(0, 0), 400.0, 64);
    let east = build_surface(&f, ChunkCoord::new(1, 0), 400.0, 64);
    let south = build_surface(&f, ChunkCoord::new(0, 1), 400.0, 64);
    assert_shared_edge(&a, &east, true).expect("east seam");
    assert_shared_edge(&a, &south, false).expect("south seam");
}

#[test]
fn negative_chunks_share_edges_exactly() {
    let f = field();
    let a = build_surface(&f, ChunkCoord::new(-1, -1), 400.0, 64);
    let east = build_surface(&f, ChunkCoord::new(0, -1), 400.0, 64);
    assert_shared_edge(&a, &east, true).expect("seam across origin");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // any neighbour pair agrees bit-for-bit along the edge they share
    #[test]
    fn seams_hold_anywhere(cx in -3000i32..3000, cz in -3000i32..3000, res in 1u32..24, east in any::<bool>()) {
        let f = field();
        let a = build_surface(&f, ChunkCoord::new(cx, cz), 400.0, res);
        let other = if east { ChunkCoord::new(cx + 1, cz) } else { ChunkCoord::new(cx, cz + 1) };
        let b = build_surface(&f, other, 400.0, res);
        assert_shared_edge(&a, &b, east)?;
    }

    // odd chunk sizes still line up once snapped
    #[test]
    fn seams_hold_for_uneven_steps(cx in -100i32..100, size in 50.0f64..700.0, res in 3u32..17) {
        let f = field();
        let a = build_surface(&f, ChunkCoord::new(cx, 0), size, res);
        let b = build_surface(&f, ChunkCoord::new(cx + 1, 0), size, res);
        assert_shared_edge(&a, &b, true)?;
    }
}
