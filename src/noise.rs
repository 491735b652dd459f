// The self-extending Perlin noise field.
//
// A NoiseField answers "what is the noise at integer coordinate (x, y)?" for
// ANY (x, y), including far-negative ones, while only materialising the
// part of the plane that has actually been asked for. The buffer grows in
// whole chunks, appended on whichever side ran out, and existing cells are
// never recomputed: a value returned once stays bit-identical for the
// lifetime of the field.

use ndarray::{Array2, Axis, concatenate, s};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng, thread_rng};

/// Minimum number of columns/rows one extension appends.
const BUFFER_CHUNKS: usize = 500;

/// Columns/rows in the seed buffer built at construction.
const INITIAL_SIZE: usize = 10;

/// Domain-warp step: a noise value of 1.0 moves the sample point this far
/// (times `feedback`) across the coordinate plane.
const WARP_STEP: f64 = 300.0;

/// Gradient set for the lattice corners; a corner hash picks one of these
/// unit vectors to dot with the offset from that corner.
const GRADIENTS: [[f64; 2]; 4] = [[0.0, 1.0], [0.0, -1.0], [1.0, 0.0], [-1.0, 0.0]];

pub struct NoiseField {
    pub seed: u64,
    pub scale: f64,
    /// Materialised values, row-major: field[[y, x]].
    field: Array2<f64>,
    /// Real-valued (noise-space) coordinate backing each column/row. The
    /// logical coordinate x always sits at real coordinate x * scale, so
    /// extension continues these sequences rather than restarting them.
    x_lin: Vec<f64>,
    y_lin: Vec<f64>,
    /// How many columns/rows have been prepended; translates a caller's
    /// (possibly negative) coordinate into a buffer index.
    x_negative_buffer: usize,
    y_negative_buffer: usize,
    buffer_chunks: usize,
    /// 256 shuffled entries doubled to 512, so corner hashing never needs a
    /// wraparound branch. Depends only on `seed`, so it is built once here
    /// instead of once per extension.
    perm: [usize; 512],
}

impl NoiseField {
    /// `scale` is the spatial frequency (sensible values are well below 1;
    /// 0 switches the field off entirely). `None` draws a seed at random.
    pub fn new(scale: f64, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| thread_rng().gen_range(0..10_000));
        let mut table: Vec<usize> = (0..256).collect();
        table.shuffle(&mut StdRng::seed_from_u64(seed));
        let mut perm = [0usize; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i % 256];
        }

        let x_lin: Vec<f64> = (0..INITIAL_SIZE).map(|i| i as f64 * scale).collect();
        let y_lin = x_lin.clone();
        let mut field = NoiseField {
            seed,
            scale,
            field: Array2::zeros((0, 0)),
            x_lin,
            y_lin,
            x_negative_buffer: 0,
            y_negative_buffer: 0,
            buffer_chunks: BUFFER_CHUNKS,
            perm,
        };
        field.field = field.perlin_field(&field.x_lin, &field.y_lin);
        field
    }

    /// Noise at an integer coordinate, anywhere on the plane. Values sit in
    /// roughly [0, 1]; the +0.5 shift is not a hard clamp, so extreme
    /// gradient configurations can overshoot slightly (see the range test).
    pub fn noise(&mut self, xy: (i64, i64)) -> f64 {
        if self.scale == 0.0 {
            return 0.0;
        }
        self.ensure_covers(xy, xy);
        let (col, row) = self.buffer_index(xy);
        self.field[[row, col]]
    }

    /// Noise over a whole rectangle in one shot: element [dy][dx] equals
    /// `noise((origin.0 + dx, origin.1 + dy))`. This is the call shades lean
    /// on: one buffer slice instead of width*height lookups.
    pub fn noise_range(&mut self, origin: (i64, i64), width: usize, height: usize) -> Array2<f64> {
        if self.scale == 0.0 || width == 0 || height == 0 {
            return Array2::zeros((height, width));
        }
        let max = (origin.0 + width as i64 - 1, origin.1 + height as i64 - 1);
        self.ensure_covers(origin, max);
        let (col, row) = self.buffer_index(origin);
        self.field
            .slice(s![row..row + height, col..col + width])
            .to_owned()
    }

    /// Domain-warped noise: perturb the sample point by noise of itself,
    /// `depth` times, then sample. One warp value per level is shared by
    /// both axes, and the loop keeps the cost linear in depth where the
    /// naive recursion doubles per level.
    pub fn recursive_noise(&mut self, xy: (i64, i64), depth: u32, feedback: f64) -> f64 {
        let mut value = self.noise(xy);
        for _ in 0..depth {
            let shift = value * feedback * WARP_STEP;
            let warped = ((xy.0 as f64 + shift) as i64, (xy.1 as f64 + shift) as i64);
            value = self.noise(warped);
        }
        value
    }

    /// Translate a logical coordinate into buffer indices. Only meaningful
    /// after `ensure_covers`; a miss here is an internal invariant violation
    /// and the subsequent index panics rather than returning wrong data.
    fn buffer_index(&self, xy: (i64, i64)) -> (usize, usize) {
        (
            (xy.0 + self.x_negative_buffer as i64) as usize,
            (xy.1 + self.y_negative_buffer as i64) as usize,
        )
    }

    /// Grow the buffer, in whole chunks, until the logical rectangle
    /// [min.0, max.0] x [min.1, max.1] maps inside it. Left/top growth also
    /// moves the negative-buffer offsets, so the right/bottom checks
    /// re-translate afterwards.
    fn ensure_covers(&mut self, min: (i64, i64), max: (i64, i64)) {
        let col = min.0 + self.x_negative_buffer as i64;
        if col < 0 {
            let n = roundup(col.unsigned_abs() as usize, self.buffer_chunks);
            self.buffer_field_left(n);
        }
        let row = min.1 + self.y_negative_buffer as i64;
        if row < 0 {
            let n = roundup(row.unsigned_abs() as usize, self.buffer_chunks);
            self.buffer_field_top(n);
        }

        let col = max.0 + self.x_negative_buffer as i64;
        let excess = col - self.field.ncols() as i64 + 1;
        if excess > 0 {
            let n = roundup(excess as usize, self.buffer_chunks);
            self.buffer_field_right(n);
        }
        let row = max.1 + self.y_negative_buffer as i64;
        let excess = row - self.field.nrows() as i64 + 1;
        if excess > 0 {
            let n = roundup(excess as usize, self.buffer_chunks);
            self.buffer_field_bottom(n);
        }

        debug_assert_eq!(self.field.dim(), (self.y_lin.len(), self.x_lin.len()));
    }

    /// Append `n` columns on the right, continuing the x_lin sequence.
    fn buffer_field_right(&mut self, n: usize) {
        log::debug!("noise field (seed {}): extending {} columns right", self.seed, n);
        let last = *self.x_lin.last().expect("x_lin is never empty");
        let new_x: Vec<f64> = (1..=n).map(|k| last + k as f64 * self.scale).collect();
        let block = self.perlin_field(&new_x, &self.y_lin);
        self.field = concatenate(Axis(1), &[self.field.view(), block.view()])
            .expect("row counts agree when extending right");
        self.x_lin.extend(new_x);
    }

    /// Append `n` rows at the bottom, continuing the y_lin sequence.
    fn buffer_field_bottom(&mut self, n: usize) {
        log::debug!("noise field (seed {}): extending {} rows down", self.seed, n);
        let last = *self.y_lin.last().expect("y_lin is never empty");
        let new_y: Vec<f64> = (1..=n).map(|k| last + k as f64 * self.scale).collect();
        let block = self.perlin_field(&self.x_lin, &new_y);
        self.field = concatenate(Axis(0), &[self.field.view(), block.view()])
            .expect("column counts agree when extending down");
        self.y_lin.extend(new_y);
    }

    /// Prepend `n` columns on the left and grow the negative-x translation.
    fn buffer_field_left(&mut self, n: usize) {
        log::debug!("noise field (seed {}): extending {} columns left", self.seed, n);
        let first = self.x_lin[0];
        let new_x: Vec<f64> = (0..n).map(|k| first - (n - k) as f64 * self.scale).collect();
        let block = self.perlin_field(&new_x, &self.y_lin);
        self.field = concatenate(Axis(1), &[block.view(), self.field.view()])
            .expect("row counts agree when extending left");
        let mut lin = new_x;
        lin.extend_from_slice(&self.x_lin);
        self.x_lin = lin;
        self.x_negative_buffer += n;
    }

    /// Prepend `n` rows at the top and grow the negative-y translation.
    fn buffer_field_top(&mut self, n: usize) {
        log::debug!("noise field (seed {}): extending {} rows up", self.seed, n);
        let first = self.y_lin[0];
        let new_y: Vec<f64> = (0..n).map(|k| first - (n - k) as f64 * self.scale).collect();
        let block = self.perlin_field(&self.x_lin, &new_y);
        self.field = concatenate(Axis(0), &[block.view(), self.field.view()])
            .expect("column counts agree when extending up");
        let mut lin = new_y;
        lin.extend_from_slice(&self.y_lin);
        self.y_lin = lin;
        self.y_negative_buffer += n;
    }

    /// Evaluate the Perlin kernel over the mesh of the two coordinate
    /// sequences. Output is (y_lin.len(), x_lin.len()). A cell depends only
    /// on its own real coordinates and the permutation table, which is what
    /// lets extension append blocks without disturbing old cells.
    fn perlin_field(&self, x_lin: &[f64], y_lin: &[f64]) -> Array2<f64> {
        let mut out = Array2::zeros((y_lin.len(), x_lin.len()));
        for (j, &real_y) in y_lin.iter().enumerate() {
            // wrap to the permutation period; rem_euclid keeps negatives positive
            let y = real_y.rem_euclid(512.0);
            let yi = (y.floor() as usize).min(511);
            let yf = y - yi as f64;
            let v = fade(yf);
            for (i, &real_x) in x_lin.iter().enumerate() {
                let x = real_x.rem_euclid(512.0);
                let xi = (x.floor() as usize).min(511);
                let xf = x - xi as f64;
                let u = fade(xf);

                let p = &self.perm;
                // four corner hashes -> gradients -> ramps toward the sample
                let n00 = grad(p[(p[xi] + yi) % 512], xf, yf);
                let n01 = grad(p[(p[xi] + yi + 1) % 512], xf, yf - 1.0);
                let n11 = grad(p[(p[(xi + 1) % 512] + yi + 1) % 512], xf - 1.0, yf - 1.0);
                let n10 = grad(p[(p[(xi + 1) % 512] + yi) % 512], xf - 1.0, yf);

                // blend along x twice, then once along y, and shift to ~[0, 1]
                let x1 = lerp(n00, n10, u);
                let x2 = lerp(n01, n11, u);
                out[[j, i]] = lerp(x1, x2, v) + 0.5;
            }
        }
        out
    }
}

/// Quintic fade 6t^5 - 15t^4 + 10t^3; zero slope at both lattice ends.
fn fade(t: f64) -> f64 {
    6.0 * t.powi(5) - 15.0 * t.powi(4) + 10.0 * t.powi(3)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Hash -> gradient vector, dotted with the offset (x, y) from the corner.
fn grad(hash: usize, x: f64, y: f64) -> f64 {
    let g = GRADIENTS[hash % 4];
    g[0] * x + g[1] * y
}

/// Round up to the next multiple of `nearest`.
fn roundup(value: usize, nearest: usize) -> usize {
    value.div_ceil(nearest) * nearest
}

/// Build one NoiseField per channel in one go; most shades want a field
/// for each of r, g and b (or each axis of a warp). `scales` and `seeds`
/// are cycled over the channels, so a one-element slice applies to all of
/// them; `seeds: None` draws an independent seed per channel.
pub fn noise_fields(scales: &[f64], seeds: Option<&[u64]>, channels: usize) -> Vec<NoiseField> {
    assert!(!scales.is_empty(), "noise_fields needs at least one scale");
    if let Some(seeds) = seeds {
        assert!(!seeds.is_empty(), "noise_fields needs at least one seed");
    }
    (0..channels)
        .map(|i| {
            let scale = scales[i % scales.len()];
            let seed = seeds.map(|s| s[i % s.len()]);
            NoiseField::new(scale, seed)
        })
        .collect()
}
