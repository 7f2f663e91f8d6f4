use std::fmt;

/// Integer grid key of a terrain chunk on the horizontal plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Chunk whose extent `[cx*S, cx*S + S)` contains the world point.
    #[inline]
    pub fn containing(x: f64, z: f64, chunk_size: f64) -> Self {
        Self {
            cx: (x / chunk_size).floor() as i32,
            cz: (z / chunk_size).floor() as i32,
        }
    }

    /// Neighbouring key; clamps at the edge of the `i32` grid.
    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx.saturating_add(dx),
            cz: self.cz.saturating_add(dz),
        }
    }

    /// World-space corner of the chunk (minimum x and z).
    #[inline]
    pub fn origin(self, chunk_size: f64) -> (f64, f64) {
        (f64::from(self.cx) * chunk_size, f64::from(self.cz) * chunk_size)
    }

    /// Ring distance used by the streaming window.
    #[inline]
    pub fn chebyshev(self, other: ChunkCoord) -> u32 {
        let dx = (i64::from(self.cx) - i64::from(other.cx)).unsigned_abs();
        let dz = (i64::from(self.cz) - i64::from(other.cz)).unsigned_abs();
        dx.max(dz).min(u64::from(u32::MAX)) as u32
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx) - i64::from(other.cx);
        let dz = i64::from(self.cz) - i64::from(other.cz);
        dx * dx + dz * dz
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cx, self.cz)
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cz)
    }
}
