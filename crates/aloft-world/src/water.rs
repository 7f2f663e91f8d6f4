//! Water surface animation: a tiling wave texture and its scroll offset.

pub const WAVE_TEXTURE_SIZE: usize = 256;

/// Animation time advanced per logical tick.
pub const TIME_PER_TICK: f32 = 0.005;
const SCROLL_U: f32 = 0.1;
const SCROLL_V: f32 = 0.05;

/// Texture-space offset of the water texture at `tick`.
///
/// Derived from the tick count alone so resident water planes are never
/// touched as time passes.
#[inline]
pub fn scroll_offset(tick: u64) -> (f32, f32) {
    let t = (tick as f64 * f64::from(TIME_PER_TICK)) as f32;
    (t * SCROLL_U, t * SCROLL_V)
}

/// Wave intensity in roughly `[0, 1]` at texel `(x, y)`.
#[inline]
fn wave_intensity(x: f32, y: f32) -> f32 {
    let a = ((x + y) * 0.02).sin() * 0.3;
    let b = (x * 0.03).sin() * (y * 0.03).sin() * 0.4;
    let c = ((x - y) * 0.015).sin() * 0.2;
    (a + b + c + 1.0) * 0.5
}

/// Row-major RGBA8 wave texture of `size * size` texels.
pub fn wave_texture(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size * size * 4);
    for y in 0..size {
        for x in 0..size {
            let i = wave_intensity(x as f32, y as f32);
            data.push(to_u8(30.0 + i * 60.0));
            data.push(to_u8(144.0 + i * 60.0));
            data.push(to_u8(255.0 - i * 30.0));
            data.push(255);
        }
    }
    data
}

#[inline]
fn to_u8(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}
