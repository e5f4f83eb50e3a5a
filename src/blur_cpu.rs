use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::error::{ReelError, ReelResult};

/// Above this sigma the blur runs on a downscaled copy and is scaled back up.
const FULL_RES_MAX_SIGMA: f32 = 8.0;

/// Gaussian blur of an RGBA image with standard deviation `sigma` pixels.
///
/// Large sigmas are computed at reduced resolution: a blur that wide removes all detail the
/// reduction would lose.
pub fn gaussian_blur(img: &RgbaImage, sigma: f32) -> ReelResult<RgbaImage> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(ReelError::validation("blur sigma must be >= 0"));
    }
    let (w, h) = img.dimensions();
    if sigma == 0.0 || w == 0 || h == 0 {
        return Ok(img.clone());
    }

    let factor = (sigma / FULL_RES_MAX_SIGMA).ceil().max(1.0) as u32;
    if factor == 1 {
        return blur_full_res(img, sigma);
    }

    let sw = (w / factor).max(1);
    let sh = (h / factor).max(1);
    let small = imageops::resize(img, sw, sh, FilterType::Triangle);
    let blurred = blur_full_res(&small, sigma / factor as f32)?;
    Ok(imageops::resize(&blurred, w, h, FilterType::Triangle))
}

fn blur_full_res(img: &RgbaImage, sigma: f32) -> ReelResult<RgbaImage> {
    let (w, h) = img.dimensions();
    let radius = (sigma * 3.0).ceil() as u32;
    let out = blur_rgba8(img.as_raw(), w, h, radius, sigma)?;
    RgbaImage::from_raw(w, h, out).ok_or_else(|| ReelError::media("blur output size mismatch"))
}

/// Separable Q16 fixed-point Gaussian over tightly packed RGBA8. Edges clamp.
pub fn blur_rgba8(src: &[u8], width: u32, height: u32, radius: u32, sigma: f32) -> ReelResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ReelError::validation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(ReelError::validation(
            "blur_rgba8 expects src matching width*height*4",
        ));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ReelResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ReelError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(ReelError::validation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|w| i64::from(*w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(width);
    for y in 0..i64::from(height) {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i64 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for (a, s) in acc.iter_mut().zip(&src[idx..idx + 4]) {
                    *a += u64::from(kw) * u64::from(*s);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for (d, a) in dst[out_idx..out_idx + 4].iter_mut().zip(acc) {
                *d = q16_to_u8(a);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(width);
    let h = i64::from(height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i64 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for (a, s) in acc.iter_mut().zip(&src[idx..idx + 4]) {
                    *a += u64::from(kw) * u64::from(*s);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for (d, a) in dst[out_idx..out_idx + 4].iter_mut().zip(acc) {
                *d = q16_to_u8(a);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../tests/unit/blur_cpu.rs"]
mod tests;
