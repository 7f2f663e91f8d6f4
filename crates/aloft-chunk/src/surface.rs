use aloft_geom::{Aabb, Rgb, Vec3};
use aloft_world::{ChunkCoord, TerrainField};

/// Ground mesh of one chunk: a `(resolution + 1)^2` vertex grid with
/// positions relative to the chunk origin.
#[derive(Default, Clone, Debug)]
pub struct SurfaceMesh {
    pub resolution: u32,
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub col: Vec<f32>,
    pub idx: Vec<u32>,
    pub bounds: Aabb,
}

impl SurfaceMesh {
    /// Vertices along one edge.
    #[inline]
    pub fn side(&self) -> usize {
        self.resolution as usize + 1
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn vertex_index(&self, ix: usize, iz: usize) -> usize {
        iz * self.side() + ix
    }

    #[inline]
    pub fn position(&self, ix: usize, iz: usize) -> Vec3 {
        let i = self.vertex_index(ix, iz) * 3;
        Vec3::new(self.pos[i], self.pos[i + 1], self.pos[i + 2])
    }

    #[inline]
    pub fn height(&self, ix: usize, iz: usize) -> f32 {
        self.pos[self.vertex_index(ix, iz) * 3 + 1]
    }

    #[inline]
    pub fn normal(&self, ix: usize, iz: usize) -> Vec3 {
        let i = self.vertex_index(ix, iz) * 3;
        Vec3::new(self.norm[i], self.norm[i + 1], self.norm[i + 2])
    }

    #[inline]
    pub fn color(&self, ix: usize, iz: usize) -> Rgb {
        let i = self.vertex_index(ix, iz) * 3;
        Rgb::new(self.col[i], self.col[i + 1], self.col[i + 2])
    }
}

/// Heights over the vertex grid plus a one-sample ring around it, so edge
/// normals see the same neighbours the adjacent chunk does.
struct HeightGrid {
    side: usize,
    h: Vec<f32>,
}

impl HeightGrid {
    #[inline]
    fn at(&self, ix: isize, iz: isize) -> f32 {
        self.h[(iz + 1) as usize * self.side + (ix + 1) as usize]
    }
}

/// World coordinate of grid line `i` along one axis.
///
/// Computed as `origin + size * i / res` so the last line of one chunk and
/// the first line of its neighbour agree before snapping.
#[inline]
fn grid_line(origin: f64, size: f64, i: isize, res: u32) -> f64 {
    origin + size * i as f64 / f64::from(res)
}

pub fn build_surface(field: &TerrainField, coord: ChunkCoord, chunk_size: f64, resolution: u32) -> SurfaceMesh {
    let res = resolution.max(1);
    let (ox, oz) = coord.origin(chunk_size);
    let n = res as isize;
    let side = res as usize + 1;

    let ring = side + 2;
    let mut h = Vec::with_capacity(ring * ring);
    for iz in -1..=n + 1 {
        let wz = field.snap(grid_line(oz, chunk_size, iz, res));
        for ix in -1..=n + 1 {
            let wx = field.snap(grid_line(ox, chunk_size, ix, res));
            h.push(field.height(wx, wz));
        }
    }
    let grid = HeightGrid { side: ring, h };
    let step = (chunk_size / f64::from(res)) as f32;

    let mut mesh = SurfaceMesh {
        resolution: res,
        pos: Vec::with_capacity(side * side * 3),
        norm: Vec::with_capacity(side * side * 3),
        col: Vec::with_capacity(side * side * 3),
        idx: Vec::with_capacity(res as usize * res as usize * 6),
        bounds: Aabb::EMPTY,
    };

    for iz in 0..=n {
        let wz = field.snap(grid_line(oz, chunk_size, iz, res));
        for ix in 0..=n {
            let wx = field.snap(grid_line(ox, chunk_size, ix, res));
            let y = grid.at(ix, iz);
            let p = Vec3::new((wx - ox) as f32, y, (wz - oz) as f32);
            mesh.pos.extend_from_slice(&p.to_array());
            mesh.bounds.include(p);

            // Central differences over the ring.
            let dx = grid.at(ix + 1, iz) - grid.at(ix - 1, iz);
            let dz = grid.at(ix, iz + 1) - grid.at(ix, iz - 1);
            let normal = Vec3::new(-dx, 2.0 * step, -dz).normalized();
            mesh.norm.extend_from_slice(&normal.to_array());

            let color = field.blended_color(wx, wz);
            mesh.col.extend_from_slice(&color.to_array());
        }
    }

    let side = side as u32;
    for iz in 0..res {
        for ix in 0..res {
            let a = iz * side + ix;
            let b = a + side;
            let c = a + 1;
            let d = b + 1;
            mesh.idx.extend_from_slice(&[a, b, c, b, d, c]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use aloft_world::TerrainConfig;

    fn flat_field() -> TerrainField {
        TerrainField::with_noise(None, &TerrainConfig::default()).expect("flat field")
    }

    #[test]
    fn grid_shape_matches_resolution() {
        let field = flat_field();
        let mesh = build_surface(&field, ChunkCoord::new(0, 0), 400.0, 8);
        assert_eq!(mesh.vertex_count(), 81);
        assert_eq!(mesh.triangle_count(), 128);
        assert_eq!(mesh.col.len(), mesh.pos.len());
        assert_eq!(mesh.norm.len(), mesh.pos.len());
        assert!(mesh.idx.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn local_positions_span_the_chunk() {
        let field = flat_field();
        let mesh = build_surface(&field, ChunkCoord::new(-3, 5), 400.0, 4);
        assert_eq!(mesh.position(0, 0), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(mesh.position(4, 4), Vec3::new(400.0, 0.0, 400.0));
        assert_eq!(mesh.position(1, 2), Vec3::new(100.0, 0.0, 200.0));
        assert_eq!(mesh.bounds.min, Vec3::ZERO);
        assert_eq!(mesh.bounds.max, Vec3::new(400.0, 0.0, 400.0));
    }

    #[test]
    fn triangles_face_up() {
        let field = flat_field();
        let mesh = build_surface(&field, ChunkCoord::new(0, 0), 100.0, 2);
        for tri in mesh.idx.chunks_exact(3) {
            let p = |i: u32| {
                let i = i as usize * 3;
                Vec3::new(mesh.pos[i], mesh.pos[i + 1], mesh.pos[i + 2])
            };
            let n = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn flat_world_has_up_normals() {
        let field = flat_field();
        let mesh = build_surface(&field, ChunkCoord::new(2, 2), 400.0, 4);
        for iz in 0..=4 {
            for ix in 0..=4 {
                assert_eq!(mesh.normal(ix, iz), Vec3::UP);
                assert_eq!(mesh.height(ix, iz), 0.0);
            }
        }
    }
}
