//! Card localisation in raw frames.
//!
//! This module provides:
//! - Outline detection (`CardDetector`)
//! - Canonical corner ordering and polygon helpers (`geometry`)
//! - Perspective rectification (`rectify`)
//! - Outline overlay for the annotated frame (`annotate_outline`)

pub mod annotate;
pub mod detect;
pub mod geometry;
pub mod rectify;

pub use annotate::annotate_outline;
pub use detect::CardDetector;
pub use geometry::{Point, Quadrilateral};
pub use rectify::{rectify, RectifyError};
