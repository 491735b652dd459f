// Color-mode conversions, applied when a float buffer leaves for display or
// disk. The 8-bit channel encodings follow the usual image-library
// conventions: HSV stores hue scaled into 0-255, LAB stores L as 0-255
// (meaning 0-100) with a/b offset by 128.

use crate::types::{Color, ColorMode};

/// Convert one mode-tagged pixel to displayable RGB bytes.
pub fn to_rgb8(px: Color, mode: ColorMode) -> [u8; 3] {
    match mode {
        ColorMode::Rgb => [clamp_u8(px.0), clamp_u8(px.1), clamp_u8(px.2)],
        ColorMode::Hsv => hsv_to_rgb8(px),
        ColorMode::Lab => lab_to_rgb8(px),
    }
}

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn hsv_to_rgb8((h, s, v): Color) -> [u8; 3] {
    // unpack 0-255 channels: hue to degrees, saturation/value to 0-1
    let h = (h.clamp(0.0, 255.0) / 255.0) * 360.0;
    let s = s.clamp(0.0, 255.0) / 255.0;
    let v = v.clamp(0.0, 255.0) / 255.0;

    let c = v * s;
    let h_prime = h / 60.0;
    let x = c * (1.0 - (h_prime % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match h_prime as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [
        clamp_u8((r1 + m) * 255.0),
        clamp_u8((g1 + m) * 255.0),
        clamp_u8((b1 + m) * 255.0),
    ]
}

fn lab_to_rgb8((l, a, b): Color) -> [u8; 3] {
    // unpack the 8-bit encoding, then LAB -> XYZ (D65) -> linear RGB -> sRGB
    let l = l.clamp(0.0, 255.0) * 100.0 / 255.0;
    let a = a.clamp(0.0, 255.0) - 128.0;
    let b = b.clamp(0.0, 255.0) - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;
    let f_inv = |t: f64| {
        if t > 6.0 / 29.0 {
            t * t * t
        } else {
            3.0 * (6.0_f64 / 29.0).powi(2) * (t - 4.0 / 29.0)
        }
    };
    // D65 white point
    let x = 0.95047 * f_inv(fx);
    let y = f_inv(fy);
    let z = 1.08883 * f_inv(fz);

    let r_lin = 3.2406 * x - 1.5372 * y - 0.4986 * z;
    let g_lin = -0.9689 * x + 1.8758 * y + 0.0415 * z;
    let b_lin = 0.0557 * x - 0.2040 * y + 1.0570 * z;
    [srgb_u8(r_lin), srgb_u8(g_lin), srgb_u8(b_lin)]
}

/// Linear light 0-1 back to an sRGB byte.
fn srgb_u8(linear: f64) -> u8 {
    let l = linear.clamp(0.0, 1.0);
    let s = if l <= 0.0031308 {
        12.92 * l
    } else {
        1.055 * l.powf(1.0 / 2.4) - 0.055
    };
    clamp_u8(s * 255.0)
}
