use rusty_tesseract::TessError;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;

#[derive(Debug)]
pub struct PlateError(PlateErrorKind);

#[derive(Debug)]
pub enum PlateErrorKind {
    IOError(IOError),
    ImageError(image::ImageError),
    NoQuadrilateralFound,
    EmptyMaskRegion,
    RecognitionFailure(String),
}

impl PlateError {
    /// Which pipeline stage failed.
    pub fn kind(&self) -> &PlateErrorKind {
        &self.0
    }
}

impl<T> From<T> for PlateError
where T: Into<PlateErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for PlateError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            PlateErrorKind::IOError(e) => e.fmt(f),
            PlateErrorKind::ImageError(e) => e.fmt(f),
            PlateErrorKind::NoQuadrilateralFound => {
                write!(f, "no candidate contour simplifies to a 4-vertex polygon")
            },
            PlateErrorKind::EmptyMaskRegion => {
                write!(f, "selected polygon rasterizes to an empty mask")
            },
            PlateErrorKind::RecognitionFailure(msg) => {
                write!(f, "text recognition failed: {}", msg)
            },
        }
    }
}

impl Error for PlateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.kind() {
            PlateErrorKind::IOError(e) => e.source(),
            PlateErrorKind::ImageError(e) => e.source(),
            _ => None,
        }
    }
}

impl From<IOError> for PlateErrorKind {
    fn from(e: IOError) -> Self {
        Self::IOError(e)
    }
}

impl From<image::ImageError> for PlateErrorKind {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e)
    }
}

impl From<TessError> for PlateErrorKind {
    fn from(e: TessError) -> Self {
        Self::RecognitionFailure(e.to_string())
    }
}
