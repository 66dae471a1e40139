use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::otsu_level;

/// Crops the title band from the top of a rectified card.
///
/// The band is `ratio` of the card height, at least `min_px` rows, clamped
/// to the card itself.
pub fn crop_name_band(card: &RgbImage, ratio: f32, min_px: u32) -> RgbImage {
    let (w, h) = card.dimensions();
    let band = ((h as f32 * ratio) as u32).max(min_px).min(h);
    imageops::crop_imm(card, 0, 0, w, band).to_image()
}

/// Converts to binary using Otsu's global threshold.
///
/// Pixels brighter than the level become white (255), the rest black (0).
pub fn binarize_otsu(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    let mut output = gray.clone();
    for pixel in output.pixels_mut() {
        *pixel = if pixel[0] > level { Luma([255]) } else { Luma([0]) };
    }
    output
}

/// Grayscale → smooth upscale → Otsu binarization.
pub fn prepare_for_ocr(img: &RgbImage, upscale: f32) -> GrayImage {
    let gray = imageops::grayscale(img);
    let (w, h) = gray.dimensions();
    let scaled_w = ((w as f32 * upscale).round() as u32).max(1);
    let scaled_h = ((h as f32 * upscale).round() as u32).max(1);

    let resized = if (scaled_w, scaled_h) == (w, h) {
        gray
    } else {
        imageops::resize(&gray, scaled_w, scaled_h, FilterType::CatmullRom)
    };

    binarize_otsu(&resized)
}
