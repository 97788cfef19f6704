//! Image conditioning applied to a plate region before recognition.
//!
//! Pipeline: rescale to a recognizer-friendly size, reduce to intensity,
//! smooth with an edge-preserving bilateral filter, then binarize against a
//! Gaussian-weighted local mean so uneven illumination does not wash out
//! characters.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use ndarray::{Array2, ArrayView2};

/// Regions whose longer side is below this are rescaled.
const RESCALE_BELOW: u32 = 1000;
/// Longer side after rescaling.
const RESCALE_TARGET: f64 = 600.0;

const BILATERAL_DIAMETER: usize = 9;
const BILATERAL_SIGMA_COLOR: f32 = 75.0;
const BILATERAL_SIGMA_SPACE: f32 = 75.0;

const THRESHOLD_BLOCK: usize = 11;
const THRESHOLD_OFFSET: i32 = 2;

/// Produce the binarized, single-channel image handed to the recognizer.
///
/// Empty regions are returned as an empty image of the same size.
pub fn condition(region: &RgbImage) -> GrayImage {
    let (width, height) = region.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    let scaled = rescale_for_recognition(region);
    let intensity = to_intensity(&scaled);
    let smoothed = bilateral_filter(
        intensity.view(),
        BILATERAL_DIAMETER,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPACE,
    );
    let binary = adaptive_threshold(smoothed.view(), THRESHOLD_BLOCK, THRESHOLD_OFFSET);
    to_gray_image(&binary)
}

/// Scale so the longer side is 600 px, unless it is already 1000 px or more.
pub fn rescale_for_recognition(region: &RgbImage) -> RgbImage {
    let (width, height) = region.dimensions();
    let longest = width.max(height);
    if longest == 0 || longest >= RESCALE_BELOW {
        return region.clone();
    }

    let scale = RESCALE_TARGET / f64::from(longest);
    let new_width = ((f64::from(width) * scale) as u32).max(1);
    let new_height = ((f64::from(height) * scale) as u32).max(1);
    if (new_width, new_height) == (width, height) {
        return region.clone();
    }
    imageops::resize(region, new_width, new_height, FilterType::Triangle)
}

fn to_intensity(image: &RgbImage) -> Array2<u8> {
    let gray = imageops::grayscale(image);
    let (width, height) = gray.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        gray.get_pixel(x as u32, y as u32)[0]
    })
}

fn to_gray_image(pixels: &Array2<u8>) -> GrayImage {
    let (rows, cols) = pixels.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        Luma([pixels[[y as usize, x as usize]]])
    })
}

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge sample (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(index: isize, len: usize) -> usize {
    let len = len as isize;
    if len == 1 {
        return 0;
    }
    let mut i = index;
    while i < 0 || i >= len {
        if i < 0 {
            i = -i;
        }
        if i >= len {
            i = 2 * (len - 1) - i;
        }
    }
    i as usize
}

fn clamp_index(index: isize, len: usize) -> usize {
    index.clamp(0, len as isize - 1) as usize
}

/// Edge-preserving smoothing over a circular window of `diameter` pixels.
pub(crate) fn bilateral_filter(
    src: ArrayView2<u8>,
    diameter: usize,
    sigma_color: f32,
    sigma_space: f32,
) -> Array2<u8> {
    let (rows, cols) = src.dim();
    let radius = (diameter / 2) as isize;
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f32;
            if r2.sqrt() <= radius as f32 {
                offsets.push((dy, dx, (r2 * space_coeff).exp()));
            }
        }
    }

    let color_weights: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    Array2::from_shape_fn((rows, cols), |(y, x)| {
        let center = src[[y, x]];
        let mut sum = 0.0f32;
        let mut weight_sum = 0.0f32;
        for &(dy, dx, space_weight) in &offsets {
            let sy = reflect_101(y as isize + dy, rows);
            let sx = reflect_101(x as isize + dx, cols);
            let value = src[[sy, sx]];
            let weight = space_weight * color_weights[usize::from(center.abs_diff(value))];
            sum += weight * f32::from(value);
            weight_sum += weight;
        }
        (sum / weight_sum).round().clamp(0.0, 255.0) as u8
    })
}

/// Gaussian kernel of odd size `size`, normalized to sum to one.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as isize;
    let raw: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Binarize each pixel against the Gaussian-weighted mean of its
/// `block` x `block` neighbourhood: white when `value > mean - offset`.
pub(crate) fn adaptive_threshold(src: ArrayView2<u8>, block: usize, offset: i32) -> Array2<u8> {
    let (rows, cols) = src.dim();
    let kernel = gaussian_kernel(block);
    let half = (block / 2) as isize;

    let horizontal = Array2::from_shape_fn((rows, cols), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let sx = clamp_index(x as isize + k as isize - half, cols);
                w * f32::from(src[[y, sx]])
            })
            .sum::<f32>()
    });

    Array2::from_shape_fn((rows, cols), |(y, x)| {
        let mean: f32 = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let sy = clamp_index(y as isize + k as isize - half, rows);
                w * horizontal[[sy, x]]
            })
            .sum();
        let mean = mean.round() as i32;
        if i32::from(src[[y, x]]) - mean > -offset {
            255
        } else {
            0
        }
    })
}
