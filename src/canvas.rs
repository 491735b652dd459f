// The canvas: where shapes, shades and noise come together.
//
// Nothing is painted when a shape method runs. Each call rasterizes its
// shape into a 0/1 mask and pushes (shade, mask) onto a draw stack; the
// stack is only flattened into pixels when `image()`, `show()` or `save()`
// is called. Deferring buys one thing: consecutive draws with the same
// shade get merged into a single mask, so the shade (usually a noise pull,
// the dominant cost) is evaluated once over the union instead of once per
// shape.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use image::{ImageFormat, RgbImage};
use minifb::{Key, Window, WindowOptions};
use ndarray::{Array2, Array3, Zip, s};

use crate::error::Error;
use crate::noise::NoiseField;
use crate::shade::Shade;
use crate::types::{Color, ColorMode, PixelBuffer};

pub struct Canvas {
    width: usize,
    height: usize,
    mode: ColorMode,
    /// (height, width, 3) accumulated pixels; survives across renders so
    /// later draw batches layer on top of earlier ones.
    image_array: Array3<f64>,
    /// Deferred draws, insertion order = paint order.
    stack: Vec<(Shade, Array2<u8>)>,
}

impl Canvas {
    pub fn new(
        width: usize,
        height: usize,
        background: Color,
        mode: ColorMode,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let image_array = Array3::from_shape_fn((height, width, 3), |(_, _, c)| match c {
            0 => background.0,
            1 => background.1,
            _ => background.2,
        });
        Ok(Canvas {
            width,
            height,
            mode,
            image_array,
            stack: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn x_center(&self) -> i64 {
        (self.width / 2) as i64
    }

    pub fn y_center(&self) -> i64 {
        (self.height / 2) as i64
    }

    pub fn center(&self) -> (i64, i64) {
        (self.x_center(), self.y_center())
    }

    /// Coordinates of a step grid over the canvas (edges included), x
    /// varying slowest. Saves the usual pair of nested ranges when placing
    /// shapes in a lattice.
    pub fn grid(&self, x_step: usize, y_step: usize) -> Vec<(i64, i64)> {
        let mut coords = Vec::new();
        for x in (0..=self.width).step_by(x_step.max(1)) {
            for y in (0..=self.height).step_by(y_step.max(1)) {
                coords.push((x as i64, y as i64));
            }
        }
        coords
    }

    /* ---------------- shape methods: rasterize + defer ---------------- */

    /// Filled half-open box [x, x+width) x [y, y+height).
    pub fn rectangle(
        &mut self,
        shade: &Shade,
        corner: (i64, i64),
        width: usize,
        height: usize,
    ) -> &mut Self {
        let mask = self.rectangle_mask(corner, width, height);
        self.push(shade, mask)
    }

    /// `rectangle`, then a rigid rotation of the mask about `pivot`
    /// (defaults to the corner).
    pub fn rectangle_rotated(
        &mut self,
        shade: &Shade,
        corner: (i64, i64),
        width: usize,
        height: usize,
        degrees: f64,
        pivot: Option<(i64, i64)>,
    ) -> &mut Self {
        let mask = self.rectangle_mask(corner, width, height);
        let mask = self.rotate_mask(&mask, pivot.unwrap_or(corner), degrees);
        self.push(shade, mask)
    }

    pub fn square(&mut self, shade: &Shade, corner: (i64, i64), size: usize) -> &mut Self {
        self.rectangle(shade, corner, size, size)
    }

    /// Rectangle outline as its four edge lines.
    pub fn rectangle_outline(
        &mut self,
        shade: &Shade,
        corner: (i64, i64),
        width: usize,
        height: usize,
        weight: usize,
    ) -> &mut Self {
        let (x, y) = corner;
        let (w, h) = (width as i64, height as i64);
        self.line(shade, corner, (x, y + h), weight);
        self.line(shade, corner, (x + w, y), weight);
        self.line(shade, (x, y + h), (x + w, y + h), weight);
        self.line(shade, (x + w, y), (x + w, y + h), weight)
    }

    pub fn square_outline(
        &mut self,
        shade: &Shade,
        corner: (i64, i64),
        size: usize,
        weight: usize,
    ) -> &mut Self {
        self.rectangle_outline(shade, corner, size, size, weight)
    }

    /// Straight line from start to end; `weight` stamps a weight x weight
    /// block at every sampled point (a stamped square, not a perpendicular
    /// thickness).
    pub fn line(
        &mut self,
        shade: &Shade,
        start: (i64, i64),
        end: (i64, i64),
        weight: usize,
    ) -> &mut Self {
        let mask = self.line_mask(start, end, weight);
        self.push(shade, mask)
    }

    pub fn line_rotated(
        &mut self,
        shade: &Shade,
        start: (i64, i64),
        end: (i64, i64),
        weight: usize,
        degrees: f64,
        pivot: Option<(i64, i64)>,
    ) -> &mut Self {
        let mask = self.line_mask(start, end, weight);
        let mask = self.rotate_mask(&mask, pivot.unwrap_or(start), degrees);
        self.push(shade, mask)
    }

    /// Line whose silhouette is pushed around by two warp noise fields
    /// before painting.
    pub fn warped_line(
        &mut self,
        shade: &Shade,
        start: (i64, i64),
        end: (i64, i64),
        warp_noise: &mut [NoiseField; 2],
        shift: f64,
        weight: usize,
    ) -> &mut Self {
        let mask = self.line_mask(start, end, weight);
        let mask = self.shift_mask_points(&mask, warp_noise, shift);
        self.push(shade, mask)
    }

    /// Filled polygon over the given vertices (wrapping last back to
    /// first), scanline filled.
    pub fn polygon(&mut self, shade: &Shade, points: &[(i64, i64)]) -> &mut Self {
        let mask = self.polygon_mask(points);
        self.push(shade, mask)
    }

    pub fn polygon_rotated(
        &mut self,
        shade: &Shade,
        points: &[(i64, i64)],
        degrees: f64,
        pivot: Option<(i64, i64)>,
    ) -> &mut Self {
        let mask = self.polygon_mask(points);
        let anchor = pivot.or_else(|| points.first().copied()).unwrap_or((0, 0));
        let mask = self.rotate_mask(&mask, anchor, degrees);
        self.push(shade, mask)
    }

    pub fn warped_polygon(
        &mut self,
        shade: &Shade,
        points: &[(i64, i64)],
        warp_noise: &mut [NoiseField; 2],
        shift: f64,
    ) -> &mut Self {
        let mask = self.polygon_mask(points);
        let mask = self.shift_mask_points(&mask, warp_noise, shift);
        self.push(shade, mask)
    }

    /// Polygon outline: one line per edge, wrapping back to the first
    /// vertex.
    pub fn polygon_outline(
        &mut self,
        shade: &Shade,
        points: &[(i64, i64)],
        weight: usize,
    ) -> &mut Self {
        for (i, &point) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            self.line(shade, point, next, weight);
        }
        self
    }

    pub fn warped_polygon_outline(
        &mut self,
        shade: &Shade,
        points: &[(i64, i64)],
        warp_noise: &mut [NoiseField; 2],
        shift: f64,
        weight: usize,
    ) -> &mut Self {
        let mask = self.outline_mask(points, weight);
        let mask = self.shift_mask_points(&mask, warp_noise, shift);
        self.push(shade, mask)
    }

    pub fn triangle(
        &mut self,
        shade: &Shade,
        a: (i64, i64),
        b: (i64, i64),
        c: (i64, i64),
    ) -> &mut Self {
        self.polygon(shade, &[a, b, c])
    }

    pub fn triangle_outline(
        &mut self,
        shade: &Shade,
        a: (i64, i64),
        b: (i64, i64),
        c: (i64, i64),
        weight: usize,
    ) -> &mut Self {
        self.polygon_outline(shade, &[a, b, c], weight)
    }

    /// Filled circle: plain distance test over the canvas grid.
    pub fn circle(&mut self, shade: &Shade, center: (i64, i64), radius: i64) -> &mut Self {
        let mask = self.circle_mask(center, radius);
        self.push(shade, mask)
    }

    /// Circle outline: polygon outline over points sampled around the
    /// circumference.
    pub fn circle_outline(
        &mut self,
        shade: &Shade,
        center: (i64, i64),
        radius: i64,
        weight: usize,
    ) -> &mut Self {
        let points = circle_edge_points(center, radius);
        self.polygon_outline(shade, &points, weight)
    }

    pub fn warped_circle(
        &mut self,
        shade: &Shade,
        center: (i64, i64),
        radius: i64,
        warp_noise: &mut [NoiseField; 2],
        shift: f64,
    ) -> &mut Self {
        let points = circle_edge_points(center, radius);
        self.warped_polygon(shade, &points, warp_noise, shift)
    }

    pub fn warped_circle_outline(
        &mut self,
        shade: &Shade,
        center: (i64, i64),
        radius: i64,
        warp_noise: &mut [NoiseField; 2],
        shift: f64,
        weight: usize,
    ) -> &mut Self {
        let points = circle_edge_points(center, radius);
        self.warped_polygon_outline(shade, &points, warp_noise, shift, weight)
    }

    /// Cover the whole canvas with one shade.
    pub fn fill(&mut self, shade: &Shade) -> &mut Self {
        self.rectangle(shade, (0, 0), self.width, self.height)
    }

    /* ---------------- the image boundary ---------------- */

    /// Render the stack and hand back the accumulated pixels.
    pub fn image(&mut self) -> PixelBuffer {
        self.render();
        PixelBuffer {
            width: self.width,
            height: self.height,
            mode: self.mode,
            data: self.image_array.clone(),
        }
    }

    /// Render, then present in a window until it is closed or ESC is hit.
    pub fn show(&mut self) -> Result<(), Error> {
        let buffer = self.image().to_argb();
        let mut window = Window::new("shades", self.width, self.height, WindowOptions::default())
            .map_err(|e| Error::Window(e.to_string()))?;
        while window.is_open() && !window.is_key_down(Key::Escape) {
            window
                .update_with_buffer(&buffer, self.width, self.height)
                .map_err(|e| Error::Window(e.to_string()))?;
        }
        Ok(())
    }

    /// Render and encode to a file; the format comes from the extension.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.encoded()?.save(path)?;
        Ok(())
    }

    /// As `save`, with the format given explicitly.
    pub fn save_with_format<P: AsRef<Path>>(
        &mut self,
        path: P,
        format: ImageFormat,
    ) -> Result<(), Error> {
        self.encoded()?.save_with_format(path, format)?;
        Ok(())
    }

    fn encoded(&mut self) -> Result<RgbImage, Error> {
        let pixels = self.image();
        let image = RgbImage::from_raw(self.width as u32, self.height as u32, pixels.to_rgb8())
            .expect("rgb byte length matches canvas dimensions");
        Ok(image)
    }

    /* ---------------- the deferred-draw machinery ---------------- */

    fn push(&mut self, shade: &Shade, mask: Array2<u8>) -> &mut Self {
        self.stack.push((Rc::clone(shade), mask));
        self
    }

    /// Merge runs of consecutive entries sharing the same shade into one
    /// entry whose mask is the element-wise max (set union) of the run.
    /// Output-preserving: a shade's value at a pixel depends only on that
    /// pixel's coordinates, so same-shade draws commute.
    fn compress_stack(&mut self) {
        let mut compressed: Vec<(Shade, Array2<u8>)> = Vec::with_capacity(self.stack.len());
        for (shade, mask) in self.stack.drain(..) {
            match compressed.last_mut() {
                Some((last_shade, last_mask)) if Rc::ptr_eq(last_shade, &shade) => {
                    Zip::from(last_mask)
                        .and(&mask)
                        .for_each(|merged, &new| *merged = (*merged).max(new));
                }
                _ => compressed.push((shade, mask)),
            }
        }
        self.stack = compressed;
    }

    /// Flatten the stack onto the pixel buffer, oldest first, then clear
    /// it. A panicking shade propagates and leaves the stack in place.
    fn render(&mut self) {
        let before = self.stack.len();
        self.compress_stack();
        log::debug!(
            "rendering {} draw(s) ({} before compression)",
            self.stack.len(),
            before
        );
        for idx in 0..self.stack.len() {
            let (shade, mask) = {
                let (shade, mask) = &self.stack[idx];
                (Rc::clone(shade), mask.clone())
            };
            self.render_entry(&shade, &mask);
        }
        self.stack.clear();
    }

    /// Paint one (shade, mask) pair: evaluate the shade over the mask's
    /// bounding box only, then overwrite the canvas wherever the masked
    /// result has any nonzero channel.
    fn render_entry(&mut self, shade: &Shade, mask: &Array2<u8>) {
        let Some((min_x, min_y, max_x, max_y)) = bounding_box(mask) else {
            return; // fully clipped away: a no-op, not an error
        };
        let width = max_x - min_x + 1;
        let height = max_y - min_y + 1;
        let colors = (**shade)((min_x as i64, min_y as i64), width, height);
        debug_assert_eq!(colors.dim(), (height, width, 3));
        for y in 0..height {
            for x in 0..width {
                let (gy, gx) = (min_y + y, min_x + x);
                if mask[[gy, gx]] == 0 {
                    continue; // the mask may be any silhouette inside its bbox
                }
                let pixel = colors.slice(s![y, x, ..]);
                // last write wins where nonzero; an all-zero shade pixel
                // leaves the existing canvas pixel alone
                if pixel.iter().any(|&v| v != 0.0) {
                    self.image_array.slice_mut(s![gy, gx, ..]).assign(&pixel);
                }
            }
        }
    }

    /* ---------------- mask construction ---------------- */

    fn empty_mask(&self) -> Array2<u8> {
        Array2::zeros((self.height, self.width))
    }

    /// Set one mask cell if (x, y) lands on the canvas.
    fn mark(&self, mask: &mut Array2<u8>, x: i64, y: i64) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        mask[[y, x]] = 1;
    }

    /// Mark a weight x weight block anchored at (x, y).
    fn stamp(&self, mask: &mut Array2<u8>, x: i64, y: i64, weight: usize) {
        for dy in 0..weight.max(1) as i64 {
            for dx in 0..weight.max(1) as i64 {
                self.mark(mask, x + dx, y + dy);
            }
        }
    }

    fn rectangle_mask(&self, corner: (i64, i64), width: usize, height: usize) -> Array2<u8> {
        let mut mask = self.empty_mask();
        let x0 = corner.0.max(0);
        let y0 = corner.1.max(0);
        let x1 = (corner.0 + width as i64).min(self.width as i64);
        let y1 = (corner.1 + height as i64).min(self.height as i64);
        if x0 < x1 && y0 < y1 {
            mask.slice_mut(s![y0 as usize..y1 as usize, x0 as usize..x1 as usize])
                .fill(1);
        }
        mask
    }

    fn line_mask(&self, start: (i64, i64), end: (i64, i64), weight: usize) -> Array2<u8> {
        let mut mask = self.empty_mask();
        for (x, y) in points_in_line(start, end) {
            self.stamp(&mut mask, x, y, weight);
        }
        mask
    }

    /// Scanline fill: bucket every edge pixel by row, sort the crossings,
    /// and fill alternate pairs as inclusive runs (so vertices and edges
    /// belong to the shape).
    fn polygon_mask(&self, points: &[(i64, i64)]) -> Array2<u8> {
        let mut mask = self.empty_mask();
        if points.is_empty() {
            return mask;
        }
        let mut rows: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (i, &point) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            for (x, y) in points_in_line(point, next) {
                rows.entry(y).or_default().push(x);
            }
        }
        for (y, mut xs) in rows {
            xs.sort_unstable();
            for pair in xs.chunks(2) {
                let (a, b) = (pair[0], pair[pair.len() - 1]);
                for x in a..=b {
                    self.mark(&mut mask, x, y);
                }
            }
        }
        mask
    }

    /// All edges of a polygon in a single mask (for the warped outline,
    /// which must move the whole silhouette in one pass).
    fn outline_mask(&self, points: &[(i64, i64)], weight: usize) -> Array2<u8> {
        let mut mask = self.empty_mask();
        for (i, &point) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            for (x, y) in points_in_line(point, next) {
                self.stamp(&mut mask, x, y, weight);
            }
        }
        mask
    }

    fn circle_mask(&self, center: (i64, i64), radius: i64) -> Array2<u8> {
        let mut mask = self.empty_mask();
        let r2 = radius * radius;
        for y in 0..self.height as i64 {
            for x in 0..self.width as i64 {
                let (dx, dy) = (x - center.0, y - center.1);
                if dx * dx + dy * dy <= r2 {
                    mask[[y as usize, x as usize]] = 1;
                }
            }
        }
        mask
    }

    /// Rigid nearest-neighbour rotation of a mask about pivot (x, y):
    /// inverse-map every output cell back into the source, dropping
    /// out-of-bounds samples.
    fn rotate_mask(&self, mask: &Array2<u8>, pivot: (i64, i64), degrees: f64) -> Array2<u8> {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (x_center, y_center) = (pivot.0 as f64, pivot.1 as f64);
        let mut out = self.empty_mask();
        for ((i, j), slot) in out.indexed_iter_mut() {
            let (di, dj) = (i as f64 - y_center, j as f64 - x_center);
            let src_i = (cos * di - sin * dj + y_center).round();
            let src_j = (sin * di + cos * dj + x_center).round();
            if src_i < 0.0 || src_j < 0.0 {
                continue;
            }
            let (src_i, src_j) = (src_i as usize, src_j as usize);
            if src_i < self.height && src_j < self.width {
                *slot = mask[[src_i, src_j]];
            }
        }
        out
    }

    /// Move every marked point by the warp fields' offset at that point.
    /// The fields are sampled over the mask's bounding box only (noise is
    /// position-keyed, so the values match a full-canvas pull). Destinations
    /// off the canvas are dropped, and the pass can leave gaps inside a
    /// filled shape; best used on outlines.
    fn shift_mask_points(
        &self,
        mask: &Array2<u8>,
        warp_noise: &mut [NoiseField; 2],
        shift: f64,
    ) -> Array2<u8> {
        let mut out = self.empty_mask();
        let Some((min_x, min_y, max_x, max_y)) = bounding_box(mask) else {
            return out;
        };
        let (width, height) = (max_x - min_x + 1, max_y - min_y + 1);
        let origin = (min_x as i64, min_y as i64);
        let x_noise = warp_noise[0].noise_range(origin, width, height);
        let y_noise = warp_noise[1].noise_range(origin, width, height);
        for ((y, x), &marked) in mask.indexed_iter() {
            if marked == 0 {
                continue;
            }
            let (ny, nx) = (y - min_y, x - min_x);
            let dx = ((x_noise[[ny, nx]] - 0.5) * 2.0 * shift) as i64;
            let dy = ((y_noise[[ny, nx]] - 0.5) * 2.0 * shift) as i64;
            self.mark(&mut out, x as i64 + dx, y as i64 + dy);
        }
        out
    }
}

/// Points sampled uniformly around a circumference, about one per arc
/// pixel.
fn circle_edge_points(center: (i64, i64), radius: i64) -> Vec<(i64, i64)> {
    let samples = ((2.0 * std::f64::consts::PI * radius as f64).ceil() as usize).max(1);
    (0..samples)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / samples as f64;
            (
                center.0 + (radius as f64 * angle.cos()).round() as i64,
                center.1 + (radius as f64 * angle.sin()).round() as i64,
            )
        })
        .collect()
}

/// Every pixel along the line from start to end: walk the dominant axis in
/// unit steps and carry the other axis proportionally, rounding each step
/// to the nearest pixel. Zero length degrades to a single point.
fn points_in_line(start: (i64, i64), end: (i64, i64)) -> Vec<(i64, i64)> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    if dx == 0 && dy == 0 {
        return vec![start];
    }
    let steps = dx.abs().max(dy.abs());
    let x_step = dx as f64 / steps as f64;
    let y_step = dy as f64 / steps as f64;
    let mut points = Vec::with_capacity(steps as usize + 1);
    let (mut x, mut y) = (start.0 as f64, start.1 as f64);
    for _ in 0..=steps {
        points.push((x.round() as i64, y.round() as i64));
        x += x_step;
        y += y_step;
    }
    points
}

/// Nonzero bounding box of a mask as (min_x, min_y, max_x, max_y).
fn bounding_box(mask: &Array2<u8>) -> Option<(usize, usize, usize, usize)> {
    let mut bbox: Option<(usize, usize, usize, usize)> = None;
    for ((y, x), &v) in mask.indexed_iter() {
        if v == 0 {
            continue;
        }
        bbox = Some(match bbox {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::noise_fields;
    use crate::shade::{block_color, gradient};
    use ndarray::array;

    fn small_canvas() -> Canvas {
        Canvas::new(3, 3, (0.0, 0.0, 255.0), ColorMode::Rgb).unwrap()
    }

    fn grey() -> Shade {
        block_color((50.0, 50.0, 50.0))
    }

    #[test]
    fn zero_dimensions_fail_fast() {
        assert!(matches!(
            Canvas::new(0, 5, (0.0, 0.0, 0.0), ColorMode::Rgb),
            Err(Error::InvalidDimensions { width: 0, height: 5 })
        ));
    }

    #[test]
    fn untouched_canvas_renders_the_background() {
        let mut canvas = small_canvas();
        let image = canvas.image();
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(image.pixel(x, y), (0.0, 0.0, 255.0));
            }
        }
    }

    #[test]
    fn rectangle_draws_expected_mask() {
        let mut canvas = small_canvas();
        canvas.rectangle(&grey(), (1, 1), 2, 1);
        assert_eq!(canvas.stack[0].1, array![[0u8, 0, 0], [0, 1, 1], [0, 0, 0]]);
    }

    #[test]
    fn square_draws_expected_mask() {
        let mut canvas = small_canvas();
        canvas.square(&grey(), (1, 1), 2);
        assert_eq!(canvas.stack[0].1, array![[0u8, 0, 0], [0, 1, 1], [0, 1, 1]]);
    }

    #[test]
    fn square_outline_compresses_to_expected_mask() {
        let mut canvas = small_canvas();
        let shade = grey();
        canvas.square_outline(&shade, (1, 1), 2, 1);
        canvas.compress_stack();
        assert_eq!(canvas.stack.len(), 1);
        assert_eq!(canvas.stack[0].1, array![[0u8, 0, 0], [0, 1, 1], [0, 1, 0]]);
    }

    #[test]
    fn rectangle_outline_compresses_to_expected_mask() {
        let mut canvas = small_canvas();
        let shade = grey();
        canvas.rectangle_outline(&shade, (1, 1), 2, 1, 1);
        canvas.compress_stack();
        assert_eq!(canvas.stack[0].1, array![[0u8, 0, 0], [0, 1, 1], [0, 1, 1]]);
    }

    #[test]
    fn line_draws_expected_mask() {
        let mut canvas = small_canvas();
        canvas.line(&grey(), (1, 0), (0, 1), 1);
        assert_eq!(canvas.stack[0].1, array![[0u8, 1, 0], [1, 0, 0], [0, 0, 0]]);
    }

    #[test]
    fn zero_length_line_is_a_single_point() {
        let mut canvas = small_canvas();
        canvas.line(&grey(), (1, 1), (1, 1), 1);
        assert_eq!(canvas.stack[0].1, array![[0u8, 0, 0], [0, 1, 0], [0, 0, 0]]);
    }

    #[test]
    fn line_weight_stamps_blocks() {
        let mut canvas = small_canvas();
        canvas.line(&grey(), (0, 0), (1, 0), 2);
        assert_eq!(canvas.stack[0].1, array![[1u8, 1, 1], [1, 1, 1], [0, 0, 0]]);
    }

    #[test]
    fn polygon_draws_expected_mask() {
        let mut canvas = small_canvas();
        canvas.polygon(&grey(), &[(1, 1), (3, 2), (2, 2)]);
        assert_eq!(canvas.stack[0].1, array![[0u8, 0, 0], [0, 1, 0], [0, 0, 1]]);
    }

    #[test]
    fn triangle_draws_expected_mask() {
        let mut canvas = small_canvas();
        canvas.triangle(&grey(), (0, 0), (1, 0), (2, 2));
        assert_eq!(canvas.stack[0].1, array![[1u8, 1, 0], [0, 1, 1], [0, 0, 1]]);
    }

    #[test]
    fn polygon_outline_draws_expected_mask() {
        let mut canvas = small_canvas();
        let shade = grey();
        canvas.polygon_outline(&shade, &[(1, 1), (2, 1)], 1);
        canvas.compress_stack();
        assert_eq!(canvas.stack[0].1, array![[0u8, 0, 0], [0, 1, 1], [0, 0, 0]]);
    }

    #[test]
    fn circle_draws_expected_mask() {
        let mut canvas = small_canvas();
        canvas.circle(&grey(), (1, 1), 1);
        assert_eq!(canvas.stack[0].1, array![[0u8, 1, 0], [1, 1, 1], [0, 1, 0]]);
    }

    #[test]
    fn circle_outline_hugs_the_radius() {
        let mut canvas = Canvas::new(9, 9, (0.0, 0.0, 0.0), ColorMode::Rgb).unwrap();
        let shade = grey();
        canvas.circle_outline(&shade, (4, 4), 3, 1);
        canvas.compress_stack();
        let mask = &canvas.stack[0].1;
        let mut marked = 0;
        for ((y, x), &v) in mask.indexed_iter() {
            if v == 1 {
                marked += 1;
                let distance = (((x as f64) - 4.0).powi(2) + ((y as f64) - 4.0).powi(2)).sqrt();
                assert!(
                    (distance - 3.0).abs() <= 1.5,
                    "({x}, {y}) strays from the circumference"
                );
            }
        }
        assert!(marked >= 8, "outline should mark a ring of pixels");
    }

    #[test]
    fn off_canvas_shapes_clip_to_nothing() {
        let mut canvas = small_canvas();
        canvas.rectangle(&grey(), (-10, -10), 2, 2);
        canvas.rectangle(&grey(), (100, 100), 4, 4);
        assert!(canvas.stack.iter().all(|(_, m)| m.iter().all(|&v| v == 0)));
        let image = canvas.image(); // empty masks render as a no-op
        assert_eq!(image.pixel(1, 1), (0.0, 0.0, 255.0));
    }

    #[test]
    fn partially_off_canvas_rectangle_clips() {
        let mut canvas = small_canvas();
        canvas.rectangle(&grey(), (-1, 2), 2, 5);
        assert_eq!(canvas.stack[0].1, array![[0u8, 0, 0], [0, 0, 0], [1, 0, 0]]);
    }

    #[test]
    fn rotation_by_quarter_turn_moves_the_mask() {
        let mut canvas = Canvas::new(6, 6, (0.0, 0.0, 0.0), ColorMode::Rgb).unwrap();
        canvas.rectangle_rotated(&grey(), (3, 1), 2, 1, 90.0, None);
        let mask = &canvas.stack[0].1;
        let marked: Vec<(usize, usize)> = mask
            .indexed_iter()
            .filter(|&(_, &v)| v == 1)
            .map(|((y, x), _)| (x, y))
            .collect();
        assert_eq!(marked, vec![(3, 1), (3, 2)]);
    }

    #[test]
    fn rotation_by_zero_degrees_is_identity() {
        let mut canvas = small_canvas();
        canvas.rectangle(&grey(), (1, 1), 2, 1);
        let plain = canvas.stack[0].1.clone();
        canvas.rectangle_rotated(&grey(), (1, 1), 2, 1, 0.0, None);
        assert_eq!(canvas.stack[1].1, plain);
    }

    #[test]
    fn compress_stack_merges_consecutive_same_shade_runs() {
        let mut canvas = Canvas::new(8, 8, (0.0, 0.0, 0.0), ColorMode::Rgb).unwrap();
        let (a, b) = (grey(), block_color((200.0, 0.0, 0.0)));
        canvas.rectangle(&a, (0, 0), 2, 2);
        canvas.circle(&a, (5, 5), 1);
        canvas.rectangle(&b, (3, 3), 2, 2);
        canvas.rectangle(&b, (4, 4), 2, 2);
        canvas.compress_stack();
        assert_eq!(canvas.stack.len(), 2);
        // the merged mask is the union of the run's masks
        assert_eq!(canvas.stack[0].1[[0, 0]], 1);
        assert_eq!(canvas.stack[0].1[[5, 5]], 1);
    }

    #[test]
    fn compression_does_not_change_the_rendered_image() {
        let a = gradient((120.0, 60.0, 30.0), 50.0, noise_fields(&[0.03], Some(&[1, 2, 3]), 3));
        let b = block_color((10.0, 200.0, 10.0));
        let draw = |canvas: &mut Canvas| {
            canvas.rectangle(&a, (0, 0), 5, 5);
            canvas.circle(&a, (6, 6), 2);
            canvas.rectangle(&b, (2, 2), 3, 3);
            canvas.rectangle(&b, (4, 1), 2, 6);
            canvas.line(&a, (0, 7), (7, 0), 1);
        };

        let mut compressed = Canvas::new(8, 8, (1.0, 1.0, 1.0), ColorMode::Rgb).unwrap();
        draw(&mut compressed);
        compressed.render();

        let mut uncompressed = Canvas::new(8, 8, (1.0, 1.0, 1.0), ColorMode::Rgb).unwrap();
        draw(&mut uncompressed);
        for idx in 0..uncompressed.stack.len() {
            let (shade, mask) = {
                let (shade, mask) = &uncompressed.stack[idx];
                (Rc::clone(shade), mask.clone())
            };
            uncompressed.render_entry(&shade, &mask);
        }
        uncompressed.stack.clear();

        assert_eq!(compressed.image_array, uncompressed.image_array);
    }

    #[test]
    fn render_drains_the_stack_and_layers_paint_in_order() {
        let mut canvas = small_canvas();
        let (red, green) = (block_color((255.0, 0.0, 0.0)), block_color((0.0, 255.0, 0.0)));
        canvas.rectangle(&red, (0, 0), 3, 3);
        canvas.rectangle(&green, (1, 1), 1, 1);
        let image = canvas.image();
        assert!(canvas.stack.is_empty());
        assert_eq!(image.pixel(0, 0), (255.0, 0.0, 0.0));
        assert_eq!(image.pixel(1, 1), (0.0, 255.0, 0.0)); // later draw wins
    }

    #[test]
    fn pixels_accumulate_across_renders() {
        let mut canvas = small_canvas();
        let red = block_color((255.0, 0.0, 0.0));
        canvas.rectangle(&red, (0, 0), 1, 1);
        canvas.image();
        let green = block_color((0.0, 255.0, 0.0));
        canvas.rectangle(&green, (2, 2), 1, 1);
        let image = canvas.image();
        assert_eq!(image.pixel(0, 0), (255.0, 0.0, 0.0)); // first batch survives
        assert_eq!(image.pixel(2, 2), (0.0, 255.0, 0.0));
    }

    #[test]
    fn warped_line_keeps_marks_on_canvas() {
        let mut canvas = Canvas::new(20, 20, (0.0, 0.0, 0.0), ColorMode::Rgb).unwrap();
        let shade = grey();
        let mut warp = [
            NoiseField::new(0.02, Some(31)),
            NoiseField::new(0.02, Some(32)),
        ];
        canvas.warped_line(&shade, (2, 10), (17, 10), &mut warp, 4.0, 1);
        let mask = &canvas.stack[0].1;
        assert!(mask.iter().any(|&v| v == 1));
        // shift 4 moves a mark by (noise - 0.5) * 8; with the unclamped
        // noise envelope that is at most 6 pixels either way
        for ((y, _), &v) in mask.indexed_iter() {
            if v == 1 {
                assert!((y as i64 - 10).abs() <= 6);
            }
        }
    }

    #[test]
    fn warp_with_zero_shift_is_identity() {
        let mut canvas = Canvas::new(10, 10, (0.0, 0.0, 0.0), ColorMode::Rgb).unwrap();
        let shade = grey();
        let mut warp = [
            NoiseField::new(0.02, Some(1)),
            NoiseField::new(0.02, Some(2)),
        ];
        canvas.line(&shade, (1, 4), (8, 4), 1);
        canvas.warped_line(&shade, (1, 4), (8, 4), &mut warp, 0.0, 1);
        assert_eq!(canvas.stack[0].1, canvas.stack[1].1);
    }

    #[test]
    fn grid_provides_correctly_spaced_coords() {
        let canvas = Canvas::new(10, 10, (0.0, 0.0, 0.0), ColorMode::Rgb).unwrap();
        let coords = canvas.grid(10, 10);
        assert_eq!(coords, vec![(0, 0), (0, 10), (10, 0), (10, 10)]);
    }

    #[test]
    fn center_accessors() {
        let canvas = Canvas::new(7, 4, (0.0, 0.0, 0.0), ColorMode::Rgb).unwrap();
        assert_eq!(canvas.center(), (3, 2));
    }

    #[test]
    fn fill_covers_every_pixel() {
        let mut canvas = small_canvas();
        let red = block_color((255.0, 0.0, 0.0));
        canvas.fill(&red);
        let image = canvas.image();
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(image.pixel(x, y), (255.0, 0.0, 0.0));
            }
        }
    }
}
