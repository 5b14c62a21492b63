//! The one geometric augmentation: a random perspective warp.
//!
//! The image and its boxes go through the same [`Projection`]. Each box is
//! mapped by its four corners, replaced by the axis aligned hull of the mapped
//! corners and clamped to the frame. Boxes left without area are dropped.

use crate::dataset::common_structs::{LabeledImage, YoloBbox};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};
use rand::Rng;
use tracing::warn;

/// Corners of a `width` x `height` frame, clockwise from top-left.
pub fn frame_corners(width: u32, height: u32) -> [(f32, f32); 4] {
    let (w, h) = (width as f32, height as f32);
    [(0., 0.), (w, 0.), (w, h), (0., h)]
}

/// Moves each frame corner inward by a random whole number of pixels, at most
/// `max_shift` of the width horizontally and of the height vertically.
pub fn random_destination_corners<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    max_shift: f64,
    rng: &mut R,
) -> [(f32, f32); 4] {
    let max_dx = (width as f64 * max_shift) as u32;
    let max_dy = (height as f64 * max_shift) as u32;
    let (w, h) = (width as f32, height as f32);
    let mut shift = |max: u32| rng.gen_range(0..=max) as f32;
    [
        (shift(max_dx), shift(max_dy)),
        (w - shift(max_dx), shift(max_dy)),
        (w - shift(max_dx), h - shift(max_dy)),
        (shift(max_dx), h - shift(max_dy)),
    ]
}

/// Maps one box through `projection`. None when it ends up without area.
pub fn project_bbox(
    projection: &Projection,
    bb: &YoloBbox,
    width: u32,
    height: u32,
) -> Option<YoloBbox> {
    let corners = bb.to_corners(width, height).map(|(x, y)| {
        let (px, py) = *projection * (x as f32, y as f32);
        (px as f64, py as f64)
    });
    YoloBbox::from_corners(bb.class, &corners, width, height)
}

/// Warps `img` so that its frame corners land on `destination`. Pixels with no
/// source become black.
///
/// If the corners admit no projective transform the input is returned as is.
pub fn warp_perspective(
    img: &RgbImage,
    labels: &[YoloBbox],
    destination: [(f32, f32); 4],
) -> LabeledImage {
    let (width, height) = img.dimensions();
    let projection = match Projection::from_control_points(frame_corners(width, height), destination) {
        Some(projection) => projection,
        None => {
            warn!(
                "No perspective transform onto {:?} for a {}x{} image, skipping warp",
                destination, width, height
            );
            return LabeledImage::new(img.clone(), labels.to_vec());
        }
    };
    let warped = warp(img, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]));
    let labels = labels
        .iter()
        .filter_map(|bb| project_bbox(&projection, bb, width, height))
        .collect();
    LabeledImage::new(warped, labels)
}

pub fn random_perspective<R: Rng + ?Sized>(
    img: &RgbImage,
    labels: &[YoloBbox],
    max_shift: f64,
    rng: &mut R,
) -> LabeledImage {
    let (width, height) = img.dimensions();
    let destination = random_destination_corners(width, height, max_shift, rng);
    warp_perspective(img, labels, destination)
}
