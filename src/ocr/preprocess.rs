use image::{ImageBuffer, Luma, Rgba};

use crate::profile::Rect;

/// Crops a sub-region from a capture frame.
///
/// The rectangle is clamped to the image bounds before cropping.
pub fn crop_rect(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    rect: &Rect,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let (w, h) = img.dimensions();

    let x0 = rect.x.min(w);
    let y0 = rect.y.min(h);
    let rw = rect.width.min(w - x0);
    let rh = rect.height.min(h - y0);

    image::imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}

/// Converts a cropped region to binary by keeping only dark pixels.
///
/// Grayscale pixels below `threshold` become black (text), everything else
/// becomes white (background). The game renders dark text on bright
/// question and answer cards, including the highlight state, so a fixed
/// threshold gives the OCR backend maximum contrast.
pub fn binarize_dark_text(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    threshold: u8,
) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let gray = image::imageops::grayscale(img);
    let (width, height) = gray.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel[0] < threshold { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}
