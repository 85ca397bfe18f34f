//! Image preprocessing for OCR.
//!
//! Scanned pages are cleaned up before recognition: grayscale, median
//! blur against speckle noise, CLAHE to even out uneven lighting, then
//! adaptive Gaussian binarization.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::PreprocessConfig;

const HIST_SIZE: usize = 256;

/// Image preprocessor for the OCR pipeline.
#[derive(Debug, Clone)]
pub struct OcrPreprocessor {
    config: PreprocessConfig,
}

impl OcrPreprocessor {
    /// Create a preprocessor, validating the kernel sizes.
    pub fn new(config: PreprocessConfig) -> Result<Self, OcrError> {
        if config.median_kernel % 2 == 0 {
            return Err(OcrError::Preprocessing(format!(
                "median kernel must be odd, got {}",
                config.median_kernel
            )));
        }
        if config.threshold_block_size < 3 || config.threshold_block_size % 2 == 0 {
            return Err(OcrError::Preprocessing(format!(
                "threshold block size must be odd and >= 3, got {}",
                config.threshold_block_size
            )));
        }
        if config.clahe_tile_grid == 0 {
            return Err(OcrError::Preprocessing("CLAHE tile grid must be positive".into()));
        }
        Ok(Self { config })
    }

    /// Run the full preprocessing chain. The result is a binary image
    /// (every pixel 0 or 255) with the input's dimensions.
    pub fn process(&self, image: &DynamicImage) -> Result<GrayImage, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("empty image {}x{}", width, height)));
        }
        debug!("Preprocessing {}x{} image for OCR", width, height);

        let gray = image.to_luma8();
        let denoised = median_blur(&gray, self.config.median_kernel);
        let equalized = clahe(
            &denoised,
            self.config.clahe_clip_limit,
            self.config.clahe_tile_grid,
        );
        Ok(adaptive_gaussian_threshold(
            &equalized,
            self.config.threshold_block_size,
            self.config.threshold_c,
        ))
    }
}

impl Default for OcrPreprocessor {
    fn default() -> Self {
        Self {
            config: PreprocessConfig::default(),
        }
    }
}

/// Median filter with a square `kernel` and replicated borders.
/// A kernel of 1 (or 0) returns a copy.
pub fn median_blur(image: &GrayImage, kernel: u32) -> GrayImage {
    if kernel <= 1 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let radius = (kernel / 2) as i64;
    let mut result = GrayImage::new(width, height);
    let mut window = Vec::with_capacity((kernel * kernel) as usize);

    for y in 0..height {
        for x in 0..width {
            window.clear();
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let sx = clamp_coord(x as i64 + dx, width);
                    let sy = clamp_coord(y as i64 + dy, height);
                    window.push(image.get_pixel(sx, sy)[0]);
                }
            }
            window.sort_unstable();
            result.put_pixel(x, y, Luma([window[window.len() / 2]]));
        }
    }

    result
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `grid` x `grid` arrangement of tiles (fewer
/// when the image is smaller than the grid). Each tile's histogram is
/// clipped at `clip_limit * tile_area / 256`, the excess redistributed
/// evenly, and pixels are mapped by bilinear interpolation between the
/// four nearest tile lookup tables.
pub fn clahe(image: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let grid = grid.max(1);
    let tile_w = width.div_ceil(grid);
    let tile_h = height.div_ceil(grid);
    let tiles_x = width.div_ceil(tile_w) as usize;
    let tiles_y = height.div_ceil(tile_h) as usize;

    let mut luts = vec![[0u8; HIST_SIZE]; tiles_x * tiles_y];

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx as u32 * tile_w;
            let y0 = ty as u32 * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; HIST_SIZE];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[image.get_pixel(x, y)[0] as usize] += 1;
                }
            }

            let area = (x1 - x0) * (y1 - y0);
            if clip_limit > 0.0 {
                let limit = ((clip_limit * area as f32 / HIST_SIZE as f32) as u32).max(1);
                clip_histogram(&mut hist, limit);
            }

            let scale = 255.0 / area as f32;
            let lut = &mut luts[ty * tiles_x + tx];
            let mut sum = 0u32;
            for (i, count) in hist.iter().enumerate() {
                sum += count;
                lut[i] = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;
    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        let tyf = y as f32 * inv_th - 0.5;
        let ty1f = tyf.floor();
        let ya = tyf - ty1f;
        let ty1 = ((ty1f as i64).max(0) as usize).min(tiles_y - 1);
        let ty2 = ((ty1f as i64 + 1).max(0) as usize).min(tiles_y - 1);

        for x in 0..width {
            let txf = x as f32 * inv_tw - 0.5;
            let tx1f = txf.floor();
            let xa = txf - tx1f;
            let tx1 = ((tx1f as i64).max(0) as usize).min(tiles_x - 1);
            let tx2 = ((tx1f as i64 + 1).max(0) as usize).min(tiles_x - 1);

            let v = image.get_pixel(x, y)[0] as usize;
            let top = luts[ty1 * tiles_x + tx1][v] as f32 * (1.0 - xa)
                + luts[ty1 * tiles_x + tx2][v] as f32 * xa;
            let bottom = luts[ty2 * tiles_x + tx1][v] as f32 * (1.0 - xa)
                + luts[ty2 * tiles_x + tx2][v] as f32 * xa;
            let value = top * (1.0 - ya) + bottom * ya;

            result.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
        }
    }

    result
}

fn clip_histogram(hist: &mut [u32; HIST_SIZE], limit: u32) {
    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }

    let batch = excess / HIST_SIZE as u32;
    let mut residual = excess % HIST_SIZE as u32;
    for count in hist.iter_mut() {
        *count += batch;
    }

    if residual > 0 {
        let step = (HIST_SIZE / residual as usize).max(1);
        let mut i = 0;
        while i < HIST_SIZE && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

/// Binarize against a Gaussian-weighted local mean.
///
/// A pixel becomes 255 when it is brighter than the rounded weighted mean
/// of its `block_size` x `block_size` neighbourhood minus `c`, else 0.
/// Sigma follows the usual derivation from the block size
/// (`0.3 * ((block_size - 1) / 2 - 1) + 0.8`, i.e. 2.0 for 11).
pub fn adaptive_gaussian_threshold(image: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return result;
    }

    let kernel = gaussian_kernel(block_size);
    let radius = (block_size / 2) as i64;
    let w = width as usize;

    // Separable blur: horizontal pass, then vertical.
    let mut horizontal = vec![0f32; w * height as usize];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp_coord(x as i64 + k as i64 - radius, width);
                acc += image.get_pixel(sx, y)[0] as f32 * weight;
            }
            horizontal[y as usize * w + x as usize] = acc;
        }
    }

    for y in 0..height {
        for x in 0..width {
            let mut mean = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = clamp_coord(y as i64 + k as i64 - radius, height);
                mean += horizontal[sy as usize * w + x as usize] * weight;
            }

            let threshold = mean.round() - c;
            let value = image.get_pixel(x, y)[0] as f32;
            let output = if value > threshold { 255 } else { 0 };
            result.put_pixel(x, y, Luma([output]));
        }
    }

    result
}

fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

fn clamp_coord(value: i64, len: u32) -> u32 {
    value.clamp(0, len as i64 - 1) as u32
}
