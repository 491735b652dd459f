// Shades: the pluggable coloring strategies.
//
// A shade is any function (origin, width, height) -> (height, width, 3)
// color array; the canvas only ever relies on that contract, so block
// colors, noise gradients and fully custom per-pixel functions all plug in
// the same way. Values are conceptually 0-255 after clamping; an all-zero
// pixel composites as "leave the canvas alone".
//
// Noise-backed shades own their fields behind a RefCell: sampling a
// NoiseField can grow its buffer, and the whole pipeline is single-threaded
// by design, so interior mutability is the honest model.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::Array3;

use crate::noise::NoiseField;
use crate::types::Color;
use crate::utils::color_clamp;

/// The shade contract: (origin, width, height) -> (height, width, 3).
pub type ShadeFn = dyn Fn((i64, i64), usize, usize) -> Array3<f64>;

/// Shades are shared by reference; the canvas compares these pointers when
/// it compresses its draw stack.
pub type Shade = Rc<ShadeFn>;

/// Axis a positional gradient runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientAxis {
    X,
    Y,
}

fn channel(color: Color, idx: usize) -> f64 {
    match idx {
        0 => color.0,
        1 => color.1,
        _ => color.2,
    }
}

/// Fill with one color, everywhere, without variation.
pub fn block_color(color: Color) -> Shade {
    Rc::new(move |_origin, width, height| {
        Array3::from_shape_fn((height, width, 3), |(_, _, c)| channel(color, c))
    })
}

/// A gradient wobbling around `color`: each channel is pulled up or down by
/// its own noise field, by at most `color_variance`.
pub fn gradient(color: Color, color_variance: f64, color_fields: Vec<NoiseField>) -> Shade {
    assert!(
        color_fields.len() >= 3,
        "gradient needs one noise field per color channel"
    );
    let fields = RefCell::new(color_fields);
    Rc::new(move |origin, width, height| {
        let mut fields = fields.borrow_mut();
        let mut out = Array3::zeros((height, width, 3));
        for (c, field) in fields.iter_mut().take(3).enumerate() {
            let base = channel(color, c);
            let noise = field.noise_range(origin, width, height);
            for ((y, x), &n) in noise.indexed_iter() {
                out[[y, x, c]] = color_clamp(base + (n - 0.5) * 2.0 * color_variance);
            }
        }
        out
    })
}

/// Like `gradient`, but through domain-warped noise: swirled, organic
/// bands instead of smooth wobble. Warping is per pixel, so this is the
/// slowest of the shipped shades.
pub fn domain_warp_gradient(
    color: Color,
    color_variance: f64,
    color_fields: Vec<NoiseField>,
    depth: u32,
    feedback: f64,
) -> Shade {
    assert!(
        color_fields.len() >= 3,
        "domain_warp_gradient needs one noise field per color channel"
    );
    let fields = RefCell::new(color_fields);
    Rc::new(move |origin, width, height| {
        let mut fields = fields.borrow_mut();
        let mut out = Array3::zeros((height, width, 3));
        for (c, field) in fields.iter_mut().take(3).enumerate() {
            let base = channel(color, c);
            for y in 0..height {
                for x in 0..width {
                    let xy = (origin.0 + x as i64, origin.1 + y as i64);
                    let n = field.recursive_noise(xy, depth, feedback);
                    out[[y, x, c]] = color_clamp(base + (n - 0.5) * 2.0 * color_variance);
                }
            }
        }
        out
    })
}

/// Select between shades by where a warped noise value lands among
/// (lower, upper, shade) bands. A pixel matching no band stays zero, which
/// the canvas reads as "keep whatever is already there".
pub fn swirl_of_shades(
    bands: Vec<(f64, f64, Shade)>,
    swirl_field: NoiseField,
    depth: u32,
    feedback: f64,
) -> Shade {
    let field = RefCell::new(swirl_field);
    Rc::new(move |origin, width, height| {
        let mut field = field.borrow_mut();
        // evaluate every band once over the region, then pick per pixel
        let rendered: Vec<Array3<f64>> = bands
            .iter()
            .map(|(_, _, shade)| (**shade)(origin, width, height))
            .collect();
        let mut out = Array3::zeros((height, width, 3));
        for y in 0..height {
            for x in 0..width {
                let xy = (origin.0 + x as i64, origin.1 + y as i64);
                let n = field.recursive_noise(xy, depth, feedback);
                let band = bands.iter().position(|&(lo, hi, _)| lo <= n && n < hi);
                if let Some(idx) = band {
                    for c in 0..3 {
                        out[[y, x, c]] = rendered[idx][[y, x, c]];
                    }
                }
            }
        }
        out
    })
}

/// Blend between positional color stops of (color, coordinate) along one
/// axis; before the first stop and after the last the end colors hold.
pub fn linear_gradient(color_points: Vec<(Color, i64)>, axis: GradientAxis) -> Shade {
    assert!(
        !color_points.is_empty(),
        "linear_gradient needs at least one color stop"
    );
    Rc::new(move |origin, width, height| {
        let mut out = Array3::zeros((height, width, 3));
        for y in 0..height {
            for x in 0..width {
                let pos = match axis {
                    GradientAxis::X => origin.0 + x as i64,
                    GradientAxis::Y => origin.1 + y as i64,
                };
                let color = interpolate_stops(&color_points, pos);
                for c in 0..3 {
                    out[[y, x, c]] = color_clamp(channel(color, c));
                }
            }
        }
        out
    })
}

pub fn horizontal_gradient(color_points: Vec<(Color, i64)>) -> Shade {
    linear_gradient(color_points, GradientAxis::X)
}

pub fn vertical_gradient(color_points: Vec<(Color, i64)>) -> Shade {
    linear_gradient(color_points, GradientAxis::Y)
}

/// Blend between the nearest stop at-or-past `pos` and the nearest one
/// before it; clamp to the end colors outside the covered span.
fn interpolate_stops(stops: &[(Color, i64)], pos: i64) -> Color {
    let mut before: Option<(Color, i64)> = None;
    let mut after: Option<(Color, i64)> = None;
    for &(color, at) in stops {
        if at >= pos {
            if after.is_none_or(|(_, a)| at < a) {
                after = Some((color, at));
            }
        } else if before.is_none_or(|(_, b)| at > b) {
            before = Some((color, at));
        }
    }
    match (before, after) {
        (None, Some((color, _))) | (Some((color, _)), None) => color,
        (Some((last, last_at)), Some((next, next_at))) => {
            let t = (pos - last_at) as f64 / (next_at - last_at) as f64;
            (
                last.0 + (next.0 - last.0) * t,
                last.1 + (next.1 - last.1) * t,
                last.2 + (next.2 - last.2) * t,
            )
        }
        (None, None) => (0.0, 0.0, 0.0),
    }
}

/// Wrap any per-coordinate color function into the shade contract.
pub fn custom_shade<F>(f: F) -> Shade
where
    F: Fn((i64, i64)) -> Color + 'static,
{
    Rc::new(move |origin, width, height| {
        let mut out = Array3::zeros((height, width, 3));
        for y in 0..height {
            for x in 0..width {
                let color = f((origin.0 + x as i64, origin.1 + y as i64));
                out[[y, x, 0]] = color.0;
                out[[y, x, 1]] = color.1;
                out[[y, x, 2]] = color.2;
            }
        }
        out
    })
}
