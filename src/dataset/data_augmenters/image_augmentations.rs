//! Photometric augmentations. None of these move pixels, so labels are never touched here.

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};

fn saturate(value: f32) -> u8 {
    value.round().clamp(0., 255.) as u8
}

/// Multiplies every row by a left-to-right ramp from `1 - strength` to `1 + strength`.
pub fn illumination_gradient(img: &RgbImage, strength: f32) -> RgbImage {
    let (width, height) = img.dimensions();
    let step = if width > 1 {
        2. * strength / (width - 1) as f32
    } else {
        0.
    };
    let ramp: Vec<f32> = (0..width)
        .map(|x| 1. - strength + step * x as f32)
        .collect();
    RgbImage::from_fn(width, height, |x, y| {
        let factor = ramp[x as usize];
        let Rgb(channels) = *img.get_pixel(x, y);
        Rgb(channels.map(|c| saturate(c as f32 * factor)))
    })
}

/// Normalized 1D Gaussian of `size` taps. Sigma follows the kernel size the
/// same way OpenCV picks it when sigma is left at 0.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.) * 0.5 - 1.) + 0.8;
    let center = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2. * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// `kernel_size` must be odd. Borders repeat the edge pixel.
///
/// Both passes run in f32 and the result is rounded once, so a flat region
/// keeps its value.
pub fn gaussian_blur(img: &RgbImage, kernel_size: u32) -> RgbImage {
    let kernel = gaussian_kernel(kernel_size);
    let radius = (kernel.len() / 2) as i64;
    let (width, height) = img.dimensions();
    let (w, h) = (width as i64, height as i64);
    let at = |x: i64, y: i64| ((y * w + x) * 3) as usize;
    let source: Vec<f32> = img.as_raw().iter().map(|&v| v as f32).collect();

    let mut horizontal = vec![0f32; source.len()];
    for y in 0..h {
        for x in 0..w {
            let out = at(x, y);
            for (i, weight) in kernel.iter().enumerate() {
                let sx = (x + i as i64 - radius).clamp(0, w - 1);
                let src = at(sx, y);
                for c in 0..3 {
                    horizontal[out + c] += weight * source[src + c];
                }
            }
        }
    }

    let mut blurred = vec![0f32; source.len()];
    for y in 0..h {
        for x in 0..w {
            let out = at(x, y);
            for (i, weight) in kernel.iter().enumerate() {
                let sy = (y + i as i64 - radius).clamp(0, h - 1);
                let src = at(x, sy);
                for c in 0..3 {
                    blurred[out + c] += weight * horizontal[src + c];
                }
            }
        }
    }

    let raw = blurred.into_iter().map(saturate).collect();
    RgbImage::from_raw(width, height, raw).unwrap_or_else(|| img.clone())
}

/// `clamp(round(alpha * v + beta))` on every channel
pub fn brightness_contrast(img: &RgbImage, alpha: f32, beta: i32) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = pixel.0.map(|c| saturate(alpha * c as f32 + beta as f32));
    }
    out
}

/// Encodes to JPEG at `quality` and decodes again, leaving only the artifacts.
pub fn jpeg_roundtrip(img: &RgbImage, quality: u8) -> Result<RgbImage, image::ImageError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(img)?;
    Ok(image::load_from_memory_with_format(&buffer, ImageFormat::Jpeg)?.to_rgb8())
}

/// Independent sample per pixel and channel
pub fn gaussian_noise<R: Rng + ?Sized>(img: &RgbImage, noise: &Normal<f32>, rng: &mut R) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = saturate(*c as f32 + noise.sample(rng));
        }
    }
    out
}

// Reasonable values are 0.2 to 0.4
pub fn random_illumination<R: Rng + ?Sized>(
    img: &RgbImage,
    (min, max): (f32, f32),
    rng: &mut R,
) -> RgbImage {
    let strength = rng.gen_range(min..=max);
    illumination_gradient(img, strength)
}

pub fn random_blur<R: Rng + ?Sized>(img: &RgbImage, kernel_sizes: &[u32], rng: &mut R) -> RgbImage {
    match kernel_sizes.choose(rng) {
        Some(&kernel_size) => gaussian_blur(img, kernel_size),
        None => img.clone(),
    }
}

// Reasonable values are 0.85 to 1.15 and -20 to +20
pub fn random_brightness_contrast<R: Rng + ?Sized>(
    img: &RgbImage,
    (alpha_min, alpha_max): (f32, f32),
    (beta_min, beta_max): (i32, i32),
    rng: &mut R,
) -> RgbImage {
    let alpha = rng.gen_range(alpha_min..=alpha_max);
    let beta = rng.gen_range(beta_min..=beta_max);
    brightness_contrast(img, alpha, beta)
}

// Reasonable values are 40 to 80
pub fn random_jpeg_roundtrip<R: Rng + ?Sized>(
    img: &RgbImage,
    (min, max): (u8, u8),
    rng: &mut R,
) -> Result<RgbImage, image::ImageError> {
    let quality = rng.gen_range(min..=max);
    jpeg_roundtrip(img, quality)
}

/// Leaves the image alone with probability `1 - probability`.
pub fn random_noise<R: Rng + ?Sized>(
    img: &RgbImage,
    probability: f64,
    noise: &Normal<f32>,
    rng: &mut R,
) -> RgbImage {
    if rng.gen_bool(probability) {
        gaussian_noise(img, noise, rng)
    } else {
        img.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gray(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
    }

    #[test]
    fn illumination_ramps_left_to_right() {
        let out = illumination_gradient(&gray(11, 3, 100), 0.3);
        assert_eq!(out.dimensions(), (11, 3));
        assert_eq!(out.get_pixel(0, 0), &Rgb([70, 70, 70]));
        assert_eq!(out.get_pixel(5, 2), &Rgb([100, 100, 100]));
        assert_eq!(out.get_pixel(10, 1), &Rgb([130, 130, 130]));
    }

    #[test]
    fn illumination_clips_to_white() {
        let out = illumination_gradient(&gray(4, 1, 250), 0.4);
        assert_eq!(out.get_pixel(3, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        for size in [3, 5, 7] {
            let kernel = gaussian_kernel(size);
            assert_eq!(kernel.len(), size as usize);
            assert!((kernel.iter().sum::<f32>() - 1.).abs() < 1e-5);
            for i in 0..kernel.len() / 2 {
                assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-6);
            }
            assert!(kernel[kernel.len() / 2] > kernel[0]);
        }
    }

    #[test]
    fn blur_keeps_flat_image_flat() {
        for size in [3, 5, 7] {
            for value in [0, 1, 90, 128, 254, 255] {
                let out = gaussian_blur(&gray(20, 10, value), size);
                assert_eq!(out.dimensions(), (20, 10));
                assert!(
                    out.pixels().all(|p| p.0 == [value; 3]),
                    "kernel {} changed flat {}",
                    size,
                    value
                );
            }
        }
    }

    #[test]
    fn blur_keeps_mean_brightness() {
        let img = RgbImage::from_fn(24, 16, |x, y| Rgb([(x * 10) as u8, (y * 15) as u8, 200]));
        let mean = |img: &RgbImage| {
            img.pixels().flat_map(|p| p.0).map(|c| c as f64).sum::<f64>() / img.as_raw().len() as f64
        };
        for size in [3, 5, 7] {
            let out = gaussian_blur(&img, size);
            assert!((mean(&out) - mean(&img)).abs() < 0.5, "kernel {}", size);
        }
    }

    #[test]
    fn blur_works_on_tiny_images() {
        for (w, h) in [(1, 1), (1, 7), (7, 1), (2, 2)] {
            let out = gaussian_blur(&gray(w, h, 77), 7);
            assert_eq!(out.dimensions(), (w, h));
            assert!(out.pixels().all(|p| p.0 == [77; 3]));
        }
    }

    #[test]
    fn blur_spreads_a_bright_pixel() {
        let mut img = gray(9, 9, 0);
        img.put_pixel(4, 4, Rgb([255, 255, 255]));
        let out = gaussian_blur(&img, 5);
        assert!(out.get_pixel(4, 4).0[0] < 255);
        assert!(out.get_pixel(5, 4).0[0] > 0);
    }

    #[test]
    fn brightness_contrast_clips_both_ends() {
        let mut img = gray(2, 1, 0);
        img.put_pixel(1, 0, Rgb([250, 100, 10]));
        let out = brightness_contrast(&img, 1.1, 10);
        assert_eq!(out.get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([255, 120, 21]));
        let out = brightness_contrast(&img, 0.9, -20);
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([205, 70, 0]));
    }

    #[test]
    fn jpeg_roundtrip_keeps_dimensions() {
        let img = RgbImage::from_fn(40, 24, |x, y| Rgb([(x * 6) as u8, (y * 10) as u8, 128]));
        let out = jpeg_roundtrip(&img, 40).unwrap();
        assert_eq!(out.dimensions(), (40, 24));
    }

    #[test]
    fn noise_probability_zero_is_identity() {
        let img = gray(8, 8, 128);
        let noise = Normal::new(0., 6.).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_noise(&img, 0., &noise, &mut rng), img);
    }

    #[test]
    fn noise_changes_pixels_but_stays_close() {
        let img = gray(32, 32, 128);
        let noise = Normal::new(0., 6.).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let out = random_noise(&img, 1., &noise, &mut rng);
        assert_ne!(out, img);
        let mean = out.pixels().flat_map(|p| p.0).map(|c| c as f64).sum::<f64>()
            / (32. * 32. * 3.);
        assert!((mean - 128.).abs() < 2., "mean was {}", mean);
    }

    #[test]
    fn random_wrappers_respect_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        let img = gray(10, 2, 100);
        for _ in 0..20 {
            let out = random_illumination(&img, (0.2, 0.4), &mut rng);
            let left = out.get_pixel(0, 0).0[0];
            assert!((60..=80).contains(&left), "left column was {}", left);
            let out = random_brightness_contrast(&img, (0.85, 1.15), (-20, 20), &mut rng);
            let v = out.get_pixel(0, 0).0[0];
            assert!((65..=135).contains(&v), "value was {}", v);
        }
    }
}
