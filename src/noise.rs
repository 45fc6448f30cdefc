//! Seeded 2D gradient noise for terrain heights.
//!
//! The permutation table is shuffled with a small counter-based generator so
//! that two independently constructed fields with the same seed are
//! bit-identical. That is what lets the background worker rebuild its own
//! copy from nothing but the seed.

use ::noise::{NoiseFn, Seedable};

/// Number of distinct lattice hashes
pub const TABLE_SIZE: usize = 256;

/// Deterministic 2D Perlin-style noise with values in [0, 1]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseField {
    seed: u32,
    seed_counter: u32,
    /// Shuffled `0..TABLE_SIZE`, stored twice so `table[i + 1]` never wraps
    permutation_table: Box<[usize; TABLE_SIZE * 2]>,
}

impl NoiseField {
    /// Create new noise field with seed
    pub fn new(seed: u32) -> Self {
        let mut field = Self {
            seed,
            seed_counter: 0,
            permutation_table: Box::new([0; TABLE_SIZE * 2]),
        };
        field.reseed(seed);
        field
    }

    /// Discard the table and rebuild it from `seed`.
    pub fn reseed(&mut self, seed: u32) {
        self.seed = seed;
        self.seed_counter = 0;

        let table = &mut self.permutation_table;
        for (idx, entry) in table.iter_mut().enumerate() {
            *entry = idx % TABLE_SIZE;
        }

        // Fisher-Yates over the first half
        for idx in (1..TABLE_SIZE).rev() {
            let jdx = (self.next_random() * (idx + 1) as f64).floor() as usize;
            self.permutation_table.swap(idx, jdx);
        }

        let (lower, upper) = self.permutation_table.split_at_mut(TABLE_SIZE);
        upper.copy_from_slice(lower);
    }

    /// Reset the draw counter without touching the table.
    pub fn reset_counter(&mut self) {
        self.seed_counter = 0;
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn seed_counter(&self) -> u32 {
        self.seed_counter
    }

    pub fn permutation_table(&self) -> &[usize] {
        &self.permutation_table[..]
    }

    /// Sample the field at `(x, y)`.
    ///
    /// Returns a value in [0, 1]; every integer lattice point maps to 0.5.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let table = &self.permutation_table;

        let x_floor = x.floor();
        let y_floor = y.floor();
        let cell_x = (x_floor as i64 & (TABLE_SIZE as i64 - 1)) as usize;
        let cell_y = (y_floor as i64 & (TABLE_SIZE as i64 - 1)) as usize;

        let xf = x - x_floor;
        let yf = y - y_floor;

        let u = fade(xf);
        let v = fade(yf);

        let tl = table[table[cell_x] + cell_y];
        let tr = table[table[cell_x] + cell_y + 1];
        let bl = table[table[cell_x + 1] + cell_y];
        let br = table[table[cell_x + 1] + cell_y + 1];

        let na = lerp(gradient(tl, xf, yf), gradient(bl, xf - 1.0, yf), u);
        let nb = lerp(gradient(tr, xf, yf - 1.0), gradient(br, xf - 1.0, yf - 1.0), u);

        (1.0 + lerp(na, nb, v)) * 0.5
    }

    /// Mulberry32-style draw in [0, 1), keyed by seed and draw counter.
    fn next_random(&mut self) -> f64 {
        let mut t = self
            .seed
            .wrapping_add(0x6D2B_79F5)
            .wrapping_add(self.seed_counter);
        self.seed_counter = self.seed_counter.wrapping_add(1);

        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));

        (t ^ (t >> 14)) as f64 / 4_294_967_296.0
    }
}

/// Quintic smoothstep: 6t^5 - 15t^4 + 10t^3
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Dot product with one of 8 diagonal-ish gradients picked by the low 3 bits.
#[inline]
fn gradient(hash: usize, x: f64, y: f64) -> f64 {
    let h = hash & 7;
    let (u, v) = if h < 4 { (x, y) } else { (y, x) };

    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

impl NoiseFn<f64, 2> for NoiseField {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

impl Seedable for NoiseField {
    fn set_seed(mut self, seed: u32) -> Self {
        self.reseed(seed);
        self
    }

    fn seed(&self) -> u32 {
        self.seed
    }
}
