use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use super::geometry::Quadrilateral;

const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Returns a copy of `frame` with the card outline drawn on it (2 px, green).
pub fn annotate_outline(frame: &RgbImage, quad: &Quadrilateral) -> RgbImage {
    let mut annotated = frame.clone();
    let pts = quad.points;

    for i in 0..4 {
        let a = pts[i];
        let b = pts[(i + 1) % 4];
        for offset in [0.0, 1.0] {
            draw_line_segment_mut(
                &mut annotated,
                (a.x + offset, a.y),
                (b.x + offset, b.y),
                OUTLINE_COLOR,
            );
            draw_line_segment_mut(
                &mut annotated,
                (a.x, a.y + offset),
                (b.x, b.y + offset),
                OUTLINE_COLOR,
            );
        }
    }

    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::geometry::Point;

    #[test]
    fn test_outline_drawn_on_copy() {
        let frame = RgbImage::from_pixel(100, 100, Rgb([10, 10, 10]));
        let quad = Quadrilateral::new([
            Point::new(10.0, 10.0),
            Point::new(90.0, 10.0),
            Point::new(90.0, 90.0),
            Point::new(10.0, 90.0),
        ]);

        let annotated = annotate_outline(&frame, &quad);

        assert_eq!(*annotated.get_pixel(50, 10), OUTLINE_COLOR);
        assert_eq!(*annotated.get_pixel(10, 50), OUTLINE_COLOR);
        assert_eq!(*annotated.get_pixel(50, 50), Rgb([10, 10, 10]));
        assert_eq!(*frame.get_pixel(50, 10), Rgb([10, 10, 10]));
    }
}
