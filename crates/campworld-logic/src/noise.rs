//! Gradient noise and fractal sums.
//!
//! Classic 2D Perlin noise over Ken Perlin's reference permutation. The
//! table is fixed, so every sample is a pure function of its coordinates.
//! There is no seed and no state.
//!
//! ```
//! use campworld_logic::noise::{fbm, perlin_2d};
//!
//! assert_eq!(perlin_2d(3.25, -1.5), perlin_2d(3.25, -1.5));
//! let v = fbm(10.0, 20.0, 4, 0.5, 2.0, 0.05);
//! assert!((-1.0..=1.0).contains(&v));
//! ```

/// Reference permutation of 0..=255.
const PERMUTATION: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225,
    140, 36, 103, 30, 69, 142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148,
    247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219, 203, 117, 35, 11, 32,
    57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122,
    60, 211, 133, 230, 220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54,
    65, 25, 63, 161, 1, 216, 80, 73, 209, 76, 132, 187, 208, 89, 18, 169,
    200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173, 186, 3, 64,
    52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212,
    207, 206, 59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213,
    119, 248, 152, 2, 44, 154, 163, 70, 221, 153, 101, 155, 167, 43, 172, 9,
    129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232, 178, 185, 112, 104,
    218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162, 241,
    81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157,
    184, 84, 204, 176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93,
    222, 114, 67, 29, 24, 72, 243, 141, 128, 195, 78, 66, 215, 61, 156, 180,
];

/// Permutation repeated twice so corner lookups never wrap.
const PERM: [u8; 512] = doubled(PERMUTATION);

const fn doubled(table: [u8; 256]) -> [u8; 512] {
    let mut out = [0u8; 512];
    let mut i = 0;
    while i < 512 {
        out[i] = table[i & 255];
        i += 1;
    }
    out
}

/// Perlin fade curve: 6t^5 - 15t^4 + 10t^3
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

/// Dot product with one of eight fixed gradient directions.
#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

/// Sample 2D Perlin noise. Returns roughly [-1, 1]; exactly 0 on lattice points.
pub fn perlin_2d(x: f32, y: f32) -> f32 {
    let x_floor = x.floor();
    let y_floor = y.floor();
    let xi = (x_floor as i32 & 255) as usize;
    let yi = (y_floor as i32 & 255) as usize;

    let x = x - x_floor;
    let y = y - y_floor;
    let u = fade(x);
    let v = fade(y);

    let a = PERM[xi] as usize;
    let b = PERM[xi + 1] as usize;
    let aa = PERM[a + yi];
    let ab = PERM[a + yi + 1];
    let ba = PERM[b + yi];
    let bb = PERM[b + yi + 1];

    lerp(
        v,
        lerp(u, grad(aa, x, y), grad(ba, x - 1.0, y)),
        lerp(u, grad(ab, x, y - 1.0), grad(bb, x - 1.0, y - 1.0)),
    )
}

/// Fractal Brownian motion over [`perlin_2d`].
///
/// Octave `i` is weighted by `persistence^i` and sampled at
/// `scale * lacunarity^i`. The sum is normalized by the total weight, so the
/// result stays in roughly [-1, 1] regardless of octave count.
pub fn fbm(x: f32, y: f32, octaves: u32, persistence: f32, lacunarity: f32, scale: f32) -> f32 {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = scale;

    for _ in 0..octaves {
        total += perlin_2d(x * frequency, y * frequency) * amplitude;
        weight_sum += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    if weight_sum > 0.0 {
        total / weight_sum
    } else {
        0.0
    }
}
