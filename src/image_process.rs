//! The geometric plate-localization pipeline: edge map, contour candidates,
//! quadrilateral selection, mask and crop.
//!
//! Coordinate convention throughout: row = y, col = x.

use image::{imageops, DynamicImage, GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::drawing;
use imageproc::edges::canny;
use imageproc::filter::bilateral_filter;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use log::debug;

use std::cmp::Ordering;

use crate::error::{PlateError, PlateErrorKind};
use crate::utils;

const BILATERAL_WINDOW: u32 = 11;
const BILATERAL_SIGMA_COLOR: f32 = 17.0;
const BILATERAL_SIGMA_SPATIAL: f32 = 17.0;
const CANNY_LOW: f32 = 30.0;
const CANNY_HIGH: f32 = 200.0;
const MAX_CONTOURS: usize = 10;
const SIMPLIFY_TOLERANCE: f64 = 10.0;
// fraction of each polygon side skipped at both ends when collecting
// support points for the corner refinement line fits
const EDGE_SUPPORT_MARGIN: f64 = 0.2;

/// Minimal axis-aligned rectangle covering the "inside" samples of a mask.
/// Coordinates are inclusive and lie within the mask's dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub row_min: u32,
    pub row_max: u32,
    pub col_min: u32,
    pub col_max: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.col_max - self.col_min + 1
    }

    pub fn height(&self) -> u32 {
        self.row_max - self.row_min + 1
    }
}

/// Convert the image to grayscale and produce a binary edge map from it.
///
/// The bilateral filter suppresses sensor noise without blurring the plate
/// border, then a two-threshold Canny detector with hysteresis linking keeps
/// connected strong edges whole. Returns `(edge_map, grayscale)`; both share
/// the source dimensions.
pub fn build_edge_map(image: &DynamicImage) -> (GrayImage, GrayImage) {
    let gray = image.to_luma8();
    let filtered = bilateral_filter(
        &gray,
        BILATERAL_WINDOW,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPATIAL,
    );
    let edges = canny(&filtered, CANNY_LOW, CANNY_HIGH);
    (edges, gray)
}

/// Trace all closed boundaries in the edge map and keep the 10 largest by
/// enclosed area, largest first. Hierarchy relationships are discarded;
/// contours with fewer than 3 points enclose nothing and are dropped.
pub fn extract_contours(edge_map: &GrayImage) -> Vec<Vec<Point<i32>>> {
    let mut candidates: Vec<(Vec<Point<i32>>, f64)> = find_contours::<i32>(edge_map)
        .into_iter()
        .map(|c| c.points)
        .filter(|points| points.len() >= 3)
        .map(|points| {
            let area = utils::contour_area(&points);
            (points, area)
        })
        .collect();
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    candidates.truncate(MAX_CONTOURS);
    debug!("retained {} candidate contours", candidates.len());
    candidates.into_iter().map(|(points, _)| points).collect()
}

/// Simplify each contour in the given (largest-first) order and return the
/// first one that reduces to exactly 4 vertices, taken as the plate corners.
///
/// Fails with `NoQuadrilateralFound` when no candidate qualifies; the run
/// cannot continue for this image.
pub fn select_quadrilateral(
    contours: &[Vec<Point<i32>>],
) -> Result<Vec<Point<i32>>, PlateError> {
    for contour in contours {
        let polygon = approximate_polygon_dp(contour, SIMPLIFY_TOLERANCE, true);
        if polygon.len() == 4 {
            let polygon = refine_corners(contour, &polygon);
            debug!("selected quadrilateral {:?}", polygon);
            return Ok(polygon);
        }
    }
    Err(PlateErrorKind::NoQuadrilateralFound.into())
}

// A traced edge is rounded at corners, so simplification can place a vertex
// a few pixels off the true corner. Each side's straight interior is fitted
// with a total-least-squares line and adjacent lines are intersected; a side
// without enough support keeps its simplified vertex.
fn refine_corners(contour: &[Point<i32>], polygon: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = polygon.len();
    let lines: Vec<Option<EdgeLine>> = (0..n)
        .map(|i| edge_line(contour, polygon[i], polygon[(i + 1) % n]))
        .collect();
    (0..n)
        .map(|i| match (&lines[(i + n - 1) % n], &lines[i]) {
            (Some(prev), Some(next)) => prev.intersect(next).unwrap_or(polygon[i]),
            _ => polygon[i],
        })
        .collect()
}

// Infinite line as a point and a unit direction.
struct EdgeLine {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
}

impl EdgeLine {
    fn intersect(&self, other: &EdgeLine) -> Option<Point<i32>> {
        let det = self.dx * other.dy - self.dy * other.dx;
        if det.abs() < 1e-6 {
            return None;
        }
        let t = ((other.x - self.x) * other.dy - (other.y - self.y) * other.dx) / det;
        let x = self.x + t * self.dx;
        let y = self.y + t * self.dy;
        Some(Point::new(x.round() as i32, y.round() as i32))
    }
}

// Fit a line to the contour points supporting the polygon side a -> b,
// skipping the rounded ends. The principal axis of the point scatter handles
// vertical sides without a special case.
fn edge_line(contour: &[Point<i32>], a: Point<i32>, b: Point<i32>) -> Option<EdgeLine> {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (ex, ey) = (b.x as f64 - ax, b.y as f64 - ay);
    let len2 = ex * ex + ey * ey;
    if len2 == 0.0 {
        return None;
    }
    let len = len2.sqrt();
    let support: Vec<(f64, f64)> = contour
        .iter()
        .filter_map(|p| {
            let (px, py) = (p.x as f64 - ax, p.y as f64 - ay);
            let t = (px * ex + py * ey) / len2;
            if t < EDGE_SUPPORT_MARGIN || t > 1.0 - EDGE_SUPPORT_MARGIN {
                return None;
            }
            if (px * ey - py * ex).abs() / len > SIMPLIFY_TOLERANCE {
                return None;
            }
            Some((p.x as f64, p.y as f64))
        })
        .collect();
    if support.len() < 2 {
        return None;
    }
    let inv = 1.0 / support.len() as f64;
    let mx = support.iter().map(|p| p.0).sum::<f64>() * inv;
    let my = support.iter().map(|p| p.1).sum::<f64>() * inv;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in &support {
        let (ux, uy) = (x - mx, y - my);
        sxx += ux * ux;
        sxy += ux * uy;
        syy += uy * uy;
    }
    if sxx + syy == 0.0 {
        return None;
    }
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    Some(EdgeLine { x: mx, y: my, dx: theta.cos(), dy: theta.sin() })
}

/// Rasterize the quadrilateral into a fresh mask, scan the mask for its
/// bounding box and crop the grayscale image to it (bounds inclusive).
///
/// Deriving the crop from filled pixels rather than the vertex coordinates
/// keeps slightly non-convex or rotated quadrilaterals inside the crop, at
/// the cost of a full-image scan.
pub fn extract_crop(
    polygon: &[Point<i32>],
    gray: &GrayImage,
) -> Result<GrayImage, PlateError> {
    // A polygon whose endpoints coincide cannot be rasterized.
    if polygon.len() < 3 || polygon.first() == polygon.last() {
        return Err(PlateErrorKind::EmptyMaskRegion.into());
    }
    let mut mask = GrayImage::new(gray.width(), gray.height());
    drawing::draw_polygon_mut(&mut mask, polygon, Luma([255u8]));
    let bounds = mask_bounds(&mask)?;
    debug!("plate bounding box {:?}", bounds);
    let crop = imageops::crop_imm(
        gray,
        bounds.col_min,
        bounds.row_min,
        bounds.width(),
        bounds.height(),
    )
    .to_image();
    Ok(crop)
}

/// Min/max row and column of all non-zero samples in the mask.
/// A mask with no inside samples fails with `EmptyMaskRegion`.
pub fn mask_bounds(mask: &GrayImage) -> Result<BoundingBox, PlateError> {
    let mut bounds: Option<BoundingBox> = None;
    for (col, row, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        match bounds.as_mut() {
            Some(b) => {
                b.row_min = b.row_min.min(row);
                b.row_max = b.row_max.max(row);
                b.col_min = b.col_min.min(col);
                b.col_max = b.col_max.max(col);
            }
            None => {
                bounds = Some(BoundingBox {
                    row_min: row,
                    row_max: row,
                    col_min: col,
                    col_max: col,
                });
            }
        }
    }
    bounds.ok_or_else(|| PlateErrorKind::EmptyMaskRegion.into())
}
