//! Shades: generative 2d image creation.
//!
//! Callers place shapes onto a [`Canvas`] filled not with flat colors but
//! with "shades": functions that compute per-pixel color from
//! coordinate-driven procedural noise (a [`NoiseField`]). Drawing is
//! deferred: shape calls stack up (shade, mask) pairs, and rendering
//! flattens the stack so repeated draws with the same shade cost one noise
//! evaluation over their union.
//!
//! ```no_run
//! use shades::{Canvas, ColorMode, gradient, noise_fields};
//!
//! let mut canvas = Canvas::new(700, 700, (240.0, 240.0, 240.0), ColorMode::Rgb)?;
//! let ink = gradient((200.0, 80.0, 90.0), 50.0, noise_fields(&[0.02], None, 3));
//! canvas
//!     .circle(&ink, canvas.center(), 250)
//!     .rectangle(&ink, (30, 30), 120, 80);
//! canvas.save("out.png")?;
//! # Ok::<(), shades::Error>(())
//! ```
//!
//! The public surface is re-exported flat: the module split is an
//! implementation detail.

pub mod canvas;
pub mod color;
pub mod error;
pub mod noise;
pub mod shade;
pub mod types;
pub mod utils;

pub use canvas::Canvas;
pub use error::Error;
pub use noise::{NoiseField, noise_fields};
pub use shade::{
    GradientAxis, Shade, ShadeFn, block_color, custom_shade, domain_warp_gradient, gradient,
    horizontal_gradient, linear_gradient, swirl_of_shades, vertical_gradient,
};
pub use types::{Color, ColorMode, PixelBuffer};
pub use utils::{color_clamp, euclidean_distance, randomly_shift_point};
