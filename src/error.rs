// Everything that can go wrong crossing the image boundary lives here.
// Drawing itself never fails (off-canvas shapes just clip away); errors only
// come from construction and from the display/encoding collaborators.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A canvas with a zero dimension can never hold a pixel.
    #[error("canvas dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Creating or updating the preview window failed.
    #[error("window error: {0}")]
    Window(String),

    /// Encoding the rendered canvas to a file failed.
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}
