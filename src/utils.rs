// General handy math for drawing.

use rand::{Rng, thread_rng};

/// Straight-line distance between two points.
pub fn euclidean_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Randomly shift a point within the given (min, max) offset per axis.
/// Handy for breaking up the regularity of grid-placed shapes.
pub fn randomly_shift_point(
    xy: (i64, i64),
    x_range: (i64, i64),
    y_range: (i64, i64),
) -> (i64, i64) {
    let mut rng = thread_rng();
    (
        xy.0 + rng.gen_range(x_range.0..=x_range.1),
        xy.1 + rng.gen_range(y_range.0..=y_range.1),
    )
}

/// Clamp a channel value into the displayable 0-255 range.
pub fn color_clamp(value: f64) -> f64 {
    value.clamp(0.0, 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_distance_returns_expected_values() {
        let actual = euclidean_distance((-32.0, 10.0), (31.0, 34.0));
        assert!(actual > 67.4166 && actual < 67.4167);
    }

    #[test]
    fn randomly_shifted_point_stays_within_range() {
        for _ in 0..50 {
            let (x, y) = randomly_shift_point((10, -20), (-3, 3), (0, 5));
            assert!((7..=13).contains(&x));
            assert!((-20..=-15).contains(&y));
        }
    }

    #[test]
    fn color_clamp_bounds() {
        assert_eq!(color_clamp(-12.0), 0.0);
        assert_eq!(color_clamp(300.0), 255.0);
        assert_eq!(color_clamp(127.5), 127.5);
    }
}
