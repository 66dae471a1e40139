//! Perspective rectification of a detected card outline.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use thiserror::Error;

use super::geometry::Quadrilateral;

#[derive(Debug, Error, PartialEq)]
pub enum RectifyError {
    #[error("Degenerate quadrilateral: target size {width}x{height}")]
    Degenerate { width: u32, height: u32 },
    #[error("Quadrilateral is self-intersecting")]
    SelfIntersecting,
    #[error("Perspective transform is singular")]
    Singular,
}

/// Target size: the longer of each pair of opposing edges.
pub fn target_size(ordered: &Quadrilateral) -> (u32, u32) {
    let [tl, tr, br, bl] = ordered.points;
    let width = tl.distance(&tr).max(bl.distance(&br));
    let height = tl.distance(&bl).max(tr.distance(&br));
    (width as u32, height as u32)
}

/// Warps the quadrilateral region of `frame` to an upright card image.
///
/// The destination spans `[0, width] x [0, height]`, so an outline that is
/// already an axis-aligned rectangle maps by pure translation.
pub fn rectify(frame: &RgbImage, quad: &Quadrilateral) -> Result<RgbImage, RectifyError> {
    let ordered = quad.ordered();
    let (width, height) = target_size(&ordered);
    if width == 0 || height == 0 {
        return Err(RectifyError::Degenerate { width, height });
    }
    if !ordered.is_simple() {
        return Err(RectifyError::SelfIntersecting);
    }

    let (w, h) = (width as f32, height as f32);
    let from = ordered.points.map(|p| (p.x, p.y));
    let to = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    let projection = Projection::from_control_points(from, to).ok_or(RectifyError::Singular)?;

    let mut image = RgbImage::new(width, height);
    warp_into(
        frame,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut image,
    );

    Ok(image)
}
