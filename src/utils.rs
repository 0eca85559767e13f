use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing;
use imageproc::point::Point;
use imageproc::rect::Rect;

const ANNOTATION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TEXT_SCALE: f32 = 24.0;
const TEXT_OFFSET: i32 = 60;

/// Draw the accepted plate boundary and its recognized text onto a copy of
/// the original image. The rectangle spans the polygon's first and third
/// vertex as opposite corners; text is drawn below it when a font is given.
/// The source image is never touched.
pub fn annotate(
    image: &DynamicImage,
    polygon: &[Point<i32>],
    text: &str,
    font: Option<&FontVec>,
) -> RgbImage {
    let mut canvas = image.to_rgb8();
    if polygon.len() < 3 {
        return canvas;
    }
    let (a, b) = (polygon[0], polygon[2]);
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    let width = (a.x - b.x).abs().max(1) as u32;
    let height = (a.y - b.y).abs().max(1) as u32;
    let rect = Rect::at(x, y).of_size(width, height);
    drawing::draw_hollow_rect_mut(&mut canvas, rect, ANNOTATION_COLOR);
    if let Some(font) = font {
        let scale = PxScale::from(TEXT_SCALE);
        drawing::draw_text_mut(
            &mut canvas,
            ANNOTATION_COLOR,
            x,
            y + height as i32 + TEXT_OFFSET,
            scale,
            font,
            text,
        );
    }
    canvas
}

/// Enclosed area of a closed boundary by the shoelace formula.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        doubled += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    doubled.abs() as f64 / 2.0
}
