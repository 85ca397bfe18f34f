//! OCR for image-only PDF pages.
//!
//! Recognition sits behind the [`OcrEngine`] trait so the extraction
//! strategies can be exercised without model files. The native build
//! provides [`PureOcrEngine`], a PaddleOCR detector plus a Latin-script
//! recognizer (English and French).

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::{OcrPreprocessor, adaptive_gaussian_threshold, clahe, median_blur};
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Text recognition over a whole page image.
///
/// Implementations treat the image as a single uniform block of text and
/// return the recognized lines in reading order.
pub trait OcrEngine: Send + Sync {
    /// Recognize the text in `image`. A page without text yields `""`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// A recognized text line with its coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Height in pixels of the bands boxes are grouped into when ordering.
const ROW_BAND: f32 = 20.0;

/// Sort boxes by reading order (top-to-bottom, left-to-right) and join
/// their text with newlines. Empty boxes are skipped.
pub fn join_reading_order(mut boxes: Vec<TextBox>) -> String {
    boxes.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();

        // Group by approximate vertical position
        let row_a = (ay / ROW_BAND) as i32;
        let row_b = (by / ROW_BAND) as i32;

        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
        }
    });

    boxes
        .iter()
        .map(|b| b.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_rect() {
        let b = text_box(10.0, 20.0, "x");
        assert_eq!(b.rect(), (10.0, 20.0, 60.0, 30.0));
    }

    #[test]
    fn test_join_reading_order() {
        let boxes = vec![
            text_box(200.0, 42.0, "Date: 2024-01-05"),
            text_box(10.0, 5.0, "INVOICE"),
            text_box(10.0, 45.0, "Order"),
            text_box(10.0, 90.0, "  "),
        ];
        assert_eq!(join_reading_order(boxes), "INVOICE\nOrder\nDate: 2024-01-05");
    }

    #[test]
    fn test_join_reading_order_empty() {
        assert_eq!(join_reading_order(Vec::new()), "");
    }
}
