// Demo composition. What you SEE when you run this:
// • a cream canvas covered by a loose grid of noise-warped circles, each
//   filled with a noise gradient from a small palette
// • a domain-warped band swirling across the middle
// • the result saved as shades_demo.png, then shown in a window (ESC quits).
//
// RUST_LOG=debug shows the noise-field extensions and render batching.

use shades::{Canvas, ColorMode, NoiseField, Shade, gradient, noise_fields, swirl_of_shades};

fn main() -> Result<(), shades::Error> {
    env_logger::init();

    let mut canvas = Canvas::new(900, 900, (242.0, 229.0, 212.0), ColorMode::Rgb)?;

    // One noise-gradient shade per palette entry; fields get random seeds,
    // so every run comes out different.
    let palette = [
        (222.0, 152.0, 189.0),
        (91.0, 159.0, 204.0),
        (206.0, 90.0, 51.0),
        (245.0, 221.0, 51.0),
    ];
    let inks: Vec<Shade> = palette
        .iter()
        .map(|&color| gradient(color, 35.0, noise_fields(&[0.015], None, 3)))
        .collect();

    // Two fields drive the silhouette warping, one per axis.
    let mut warp = [NoiseField::new(0.01, None), NoiseField::new(0.01, None)];

    for (i, (x, y)) in canvas.grid(60, 60).into_iter().enumerate() {
        let ink = &inks[i % inks.len()];
        canvas.warped_circle(ink, (x, y), 24, &mut warp, 8.0);
    }

    // A swirled band over the middle: dark where the warped noise runs low,
    // untouched elsewhere.
    let band = swirl_of_shades(
        vec![(
            0.0,
            0.45,
            gradient((40.0, 36.0, 60.0), 25.0, noise_fields(&[0.02], None, 3)),
        )],
        NoiseField::new(0.004, None),
        2,
        0.9,
    );
    canvas.rectangle(&band, (0, 330), 900, 240);

    canvas.save("shades_demo.png")?;
    println!("saved shades_demo.png");
    canvas.show()
}
