use image::Rgba;

use super::*;

#[test]
fn radius_zero_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let out = blur_rgba8(&src, 1, 2, 0, 1.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn constant_image_is_unchanged() {
    let (w, h) = (4u32, 3u32);
    let src = [10u8, 20, 30, 255].repeat((w * h) as usize);
    let out = blur_rgba8(&src, w, h, 3, 2.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn single_pixel_energy_spreads_and_is_conserved() {
    let (w, h) = (5u32, 5u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((2 * w + 2) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = blur_rgba8(&src, w, h, 2, 1.2).unwrap();
    let nonzero = out.chunks_exact(4).filter(|px| px[3] != 0).count();
    assert!(nonzero > 1);
    let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 4);
}

#[test]
fn mismatched_buffer_is_rejected() {
    assert!(blur_rgba8(&[0u8; 7], 1, 2, 1, 1.0).is_err());
    assert!(gaussian_blur(&RgbaImage::new(2, 2), -1.0).is_err());
}

#[test]
fn wide_blur_keeps_size_and_smooths_an_edge() {
    let img = RgbaImage::from_fn(160, 90, |x, _| {
        if x < 80 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    let out = gaussian_blur(&img, 30.0).unwrap();
    assert_eq!(out.dimensions(), (160, 90));
    let left = out.get_pixel(79, 45).0[0];
    let right = out.get_pixel(80, 45).0[0];
    assert!(left > 40, "left of edge should brighten, got {left}");
    assert!(right < 215, "right of edge should darken, got {right}");
    assert!(out.pixels().all(|p| p.0[3] == 255));
}
