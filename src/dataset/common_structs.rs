use image::RgbImage;
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
/// Frequently used structs in the provided data transformers/loaders/augmenters

/// A YOLO Bounding Box: class id plus center and size as fractions of the image size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YoloBbox {
    pub class: u32,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloBbox {
    pub fn new(class: u32, center_x: f64, center_y: f64, width: f64, height: f64) -> YoloBbox {
        YoloBbox {
            class,
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Pixel corners: top-left, top-right, bottom-right, bottom-left.
    pub fn to_corners(&self, img_width: u32, img_height: u32) -> [(f64, f64); 4] {
        let (w, h) = (img_width as f64, img_height as f64);
        let (xc, yc) = (self.center_x * w, self.center_y * h);
        let (half_w, half_h) = (self.width * w / 2., self.height * h / 2.);
        let (x1, y1) = (xc - half_w, yc - half_h);
        let (x2, y2) = (xc + half_w, yc + half_h);
        [(x1, y1), (x2, y1), (x2, y2), (x1, y2)]
    }

    /// Axis aligned box around `points`, clamped to the image.
    /// None if nothing with a positive area is left after clamping.
    pub fn from_corners(
        class: u32,
        points: &[(f64, f64)],
        img_width: u32,
        img_height: u32,
    ) -> Option<YoloBbox> {
        let (w, h) = (img_width as f64, img_height as f64);
        let (x_min, x_max) = min_max(points.iter().map(|p| p.0))?;
        let (y_min, y_max) = min_max(points.iter().map(|p| p.1))?;
        let (x1, x2) = (x_min.clamp(0., w), x_max.clamp(0., w));
        let (y1, y2) = (y_min.clamp(0., h), y_max.clamp(0., h));
        Self::from_pixel_rect(class, x1, y1, x2, y2, img_width, img_height)
    }

    /// Normalizes an absolute `[x0, y0, x1, y1]` rectangle.
    /// None if width or height is not positive.
    pub fn from_pixel_rect(
        class: u32,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        img_width: u32,
        img_height: u32,
    ) -> Option<YoloBbox> {
        let (w, h) = (img_width as f64, img_height as f64);
        let width = (x1 - x0) / w;
        let height = (y1 - y0) / h;
        // also rejects NaN
        if !(width > 0. && height > 0.) {
            return None;
        }
        Some(YoloBbox {
            class,
            center_x: (x0 + x1) / 2. / w,
            center_y: (y0 + y1) / 2. / h,
            width,
            height,
        })
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    match values.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}

/// Label file line: `<class> <cx> <cy> <w> <h>`
impl fmt::Display for YoloBbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class, self.center_x, self.center_y, self.width, self.height
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseYoloBboxError {
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid field '{0}'")]
    InvalidField(String),
}

impl FromStr for YoloBbox {
    type Err = ParseYoloBboxError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(ParseYoloBboxError::FieldCount(parts.len()));
        }
        let class = parts[0]
            .parse::<u32>()
            .map_err(|_| ParseYoloBboxError::InvalidField(parts[0].to_string()))?;
        let mut values = [0f64; 4];
        for (value, part) in values.iter_mut().zip(&parts[1..]) {
            *value = part
                .parse::<f64>()
                .map_err(|_| ParseYoloBboxError::InvalidField(part.to_string()))?;
        }
        let [center_x, center_y, width, height] = values;
        Ok(YoloBbox {
            class,
            center_x,
            center_y,
            width,
            height,
        })
    }
}

/// An image with its Bounding Boxes, all in the image's own coordinate frame
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImage {
    pub image: RgbImage,
    pub labels: Vec<YoloBbox>,
}

impl LabeledImage {
    pub fn new(image: RgbImage, labels: Vec<YoloBbox>) -> LabeledImage {
        LabeledImage { image, labels }
    }
}

/// A word from the PDF text layer, `bbox` is `[x0, y0, x1, y1]` in page image pixels
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WordAnnotation {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bbox: Vec<f64>,
    #[serde(default)]
    pub page: usize,
}

impl WordAnnotation {
    pub fn rect(&self) -> Option<(f64, f64, f64, f64)> {
        match self.bbox.as_slice() {
            [x0, y0, x1, y1, ..] => Some((*x0, *y0, *x1, *y1)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub bbox: Vec<f64>,
}

/// One page in the OCR json format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    pub image_path: String,
    pub width: u32,
    pub height: u32,
    pub words: Vec<OcrWord>,
}
