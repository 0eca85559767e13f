//! Single-shot license-plate extraction: locate the plate's quadrilateral
//! boundary in a photograph, crop it, and hand the crop to an OCR engine.
//!
//! The pipeline is strictly sequential: edge map → contour candidates →
//! quadrilateral selection → mask and crop → text extraction. Every run
//! starts fresh from one input image; the OCR engine handle is the only
//! state worth keeping across runs.

use image::{DynamicImage, GrayImage};
use imageproc::point::Point;
use log::info;

pub mod error;
pub mod image_process;
pub mod ocr;
pub mod utils;

use error::PlateError;
use ocr::{TesseractRecognizer, TextRecognizer};

/// Everything a successful run produces: the plate's corner polygon, the
/// grayscale crop of the plate region, and the recognized text.
#[derive(Debug)]
pub struct PlateExtraction {
    pub polygon: Vec<Point<i32>>,
    pub crop: GrayImage,
    pub text: String,
}

pub struct PlateExtractor<R> {
    ocr: R,
}

impl PlateExtractor<TesseractRecognizer> {

    /// Pipeline backed by a Tesseract engine. Build it once and reuse it
    /// when processing more than one image.
    pub fn new() -> Self {
        Self { ocr: TesseractRecognizer::new() }
    }
}

impl Default for PlateExtractor<TesseractRecognizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TextRecognizer> PlateExtractor<R> {

    pub fn with_recognizer(ocr: R) -> Self {
        Self { ocr }
    }

    /// Run the full pipeline on one image. Any stage failure aborts the run
    /// with no partial output; see `error::PlateErrorKind` for the taxonomy.
    pub fn extract(&self, image: &DynamicImage) -> Result<PlateExtraction, PlateError> {
        let (edges, gray) = image_process::build_edge_map(image);
        let contours = image_process::extract_contours(&edges);
        let polygon = image_process::select_quadrilateral(&contours)?;
        let crop = image_process::extract_crop(&polygon, &gray)?;
        info!("plate region cropped to {}x{}", crop.width(), crop.height());
        let text = ocr::extract_text(&crop, &self.ocr)?;
        Ok(PlateExtraction { polygon, crop, text })
    }
}

#[cfg(test)]
mod test {

    use image::{DynamicImage, GrayImage, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    use super::*;
    use crate::error::PlateErrorKind;
    use crate::ocr::TextSpan;

    struct StubRecognizer(Vec<TextSpan>);

    impl TextRecognizer for StubRecognizer {
        fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextSpan>, PlateError> {
            Ok(self.0.clone())
        }
    }

    fn plate_stub() -> StubRecognizer {
        StubRecognizer(vec![TextSpan {
            region: vec![
                Point::new(0, 0),
                Point::new(100, 0),
                Point::new(100, 30),
                Point::new(0, 30),
            ],
            text: "AB123CD".to_string(),
            confidence: 0.99,
        }])
    }

    fn rectangle_canvas() -> DynamicImage {
        let mut img = RgbImage::new(400, 200);
        draw_filled_rect_mut(
            &mut img,
            Rect::at(80, 50).of_size(240, 100),
            Rgb([255, 255, 255]),
        );
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn full_run_on_synthetic_plate() {
        let extractor = PlateExtractor::with_recognizer(plate_stub());
        let res = extractor.extract(&rectangle_canvas()).unwrap();
        assert_eq!(res.polygon.len(), 4);
        assert!((res.crop.width() as i32 - 240).abs() <= 2);
        assert!((res.crop.height() as i32 - 100).abs() <= 2);
        assert_eq!(res.text, "AB123CD ");
    }

    #[test]
    fn runs_are_idempotent() {
        let extractor = PlateExtractor::with_recognizer(plate_stub());
        let img = rectangle_canvas();
        let first = extractor.extract(&img).unwrap();
        let second = extractor.extract(&img).unwrap();
        assert_eq!(first.crop.dimensions(), second.crop.dimensions());
        assert_eq!(first.text, second.text);
        assert_eq!(first.polygon, second.polygon);
    }

    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextSpan>, PlateError> {
            Err(PlateErrorKind::RecognitionFailure("engine offline".to_string()).into())
        }
    }

    #[test]
    fn engine_failure_aborts_the_run() {
        let extractor = PlateExtractor::with_recognizer(FailingRecognizer);
        let err = extractor.extract(&rectangle_canvas()).unwrap_err();
        assert!(matches!(
            err.kind(),
            PlateErrorKind::RecognitionFailure(_)
        ));
    }

    #[test]
    fn featureless_image_fails_cleanly() {
        let extractor = PlateExtractor::with_recognizer(plate_stub());
        let img = DynamicImage::ImageRgb8(RgbImage::new(64, 64));
        let err = extractor.extract(&img).unwrap_err();
        assert!(matches!(
            err.kind(),
            PlateErrorKind::NoQuadrilateralFound
        ));
    }
}
