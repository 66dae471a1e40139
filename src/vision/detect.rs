//! Card outline detection.
//!
//! grayscale → blur → Canny → dilation → external contours → keep the
//! largest contour that is big enough and simplifies to four vertices.

use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;

use super::geometry::{approximate_closed_polygon, closed_arc_length, polygon_area, Point, Quadrilateral};
use crate::config::DetectorConfig;

/// Finds the single best card-shaped quadrilateral in a frame.
pub struct CardDetector {
    config: DetectorConfig,
}

impl CardDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Returns the largest quadrilateral above the minimum area, or `None`.
    ///
    /// Ties keep the first contour seen.
    pub fn detect(&self, frame: &RgbImage) -> Option<Quadrilateral> {
        let edges = self.edge_map(frame);
        let contours = find_contours::<i32>(&edges);

        let mut best: Option<(f64, Quadrilateral)> = None;

        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        {
            let points: Vec<Point> = contour.points.iter().map(|&p| Point::from(p)).collect();

            let area = polygon_area(&points);
            if area < self.config.min_area {
                continue;
            }

            let epsilon = self.config.approx_epsilon_ratio * closed_arc_length(&points);
            let polygon = approximate_closed_polygon(&points, epsilon);
            if polygon.len() != 4 {
                continue;
            }

            if best.as_ref().is_none_or(|(best_area, _)| area > *best_area) {
                let quad = Quadrilateral::new([polygon[0], polygon[1], polygon[2], polygon[3]]);
                best = Some((area, quad));
            }
        }

        if let Some((area, quad)) = &best {
            log::debug!("Card outline found: area {:.0}, corners {:?}", area, quad.points);
        }

        best.map(|(_, quad)| quad)
    }

    /// Binary edge map with small gaps closed.
    pub fn edge_map(&self, frame: &RgbImage) -> GrayImage {
        let gray = image::imageops::grayscale(frame);
        let blurred = if self.config.blur_sigma > 0.0 {
            gaussian_blur_f32(&gray, self.config.blur_sigma)
        } else {
            gray
        };
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);
        if self.config.dilate_radius > 0 {
            dilate(&edges, Norm::LInf, self.config.dilate_radius)
        } else {
            edges
        }
    }
}

impl Default for CardDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
