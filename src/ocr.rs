//! Text recognition seam. The pipeline treats OCR as an external
//! collaborator: pixels in, ordered text spans out.

use image::GrayImage;
use imageproc::point::Point;
use rusty_tesseract::{Args, Image as TessImage};

use crate::error::PlateError;

/// One detection returned by the collaborator. `confidence` is in [0, 1].
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub region: Vec<Point<i32>>,
    pub text: String,
    pub confidence: f32,
}

/// An OCR engine the pipeline can hand a crop to. Implementations are meant
/// to be constructed once and reused across pipeline runs; model loading is
/// the expensive part, recognition is per-image.
pub trait TextRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextSpan>, PlateError>;
}

/// Concatenate the collaborator's spans into a single string, each span's
/// text followed by a single space, in detection order. No confidence
/// thresholding, no re-sorting. An empty result is an empty string.
pub fn extract_text<R: TextRecognizer>(
    crop: &GrayImage,
    engine: &R,
) -> Result<String, PlateError> {
    let spans = engine.recognize(crop)?;
    let mut text = String::new();
    for span in spans {
        text.push_str(&span.text);
        text.push(' ');
    }
    Ok(text)
}

/// Tesseract-backed recognizer, fixed to English.
///
/// The crop is staged as a PNG for the tesseract process; word-level rows of
/// its TSV output become spans, with the reported box as a rectangular
/// region and the percent confidence scaled to [0, 1].
pub struct TesseractRecognizer {
    args: Args,
}

impl TesseractRecognizer {

    pub fn new() -> Self {
        let args = Args {
            lang: "eng".to_string(),
            ..Args::default()
        };
        Self { args }
    }
}

impl TextRecognizer for TesseractRecognizer {

    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextSpan>, PlateError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("crop.png");
        image.save(&path)?;

        let tess_image = TessImage::from_path(&path)?;
        let output = rusty_tesseract::image_to_data(&tess_image, &self.args)?;
        let spans = output
            .data
            .into_iter()
            .filter(|d| d.conf >= 0.0 && !d.text.trim().is_empty())
            .map(|d| {
                let (x, y, w, h) = (d.left, d.top, d.width, d.height);
                TextSpan {
                    region: vec![
                        Point::new(x, y),
                        Point::new(x + w, y),
                        Point::new(x + w, y + h),
                        Point::new(x, y + h),
                    ],
                    text: d.text,
                    confidence: (d.conf / 100.0).max(0.0).min(1.0),
                }
            })
            .collect();
        Ok(spans)
    }
}
