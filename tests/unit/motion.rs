use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

const PORTRAIT: Canvas = Canvas {
    width: 720,
    height: 1280,
};

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x * 255 / w.max(1)) as u8, (y * 255 / h.max(1)) as u8, 90, 255])
    })
}

#[test]
fn default_weights_sum_to_one_hundred() {
    let w = EffectWeights::default();
    assert_eq!(w.total(), 100.0);
    assert_eq!(w.get(EffectKind::PanRight), 20.0);
    assert_eq!(w.get(EffectKind::ZoomOut), 15.0);
}

#[test]
fn normalization_sums_to_one_hundred() {
    let w = EffectWeights::from_pairs([(EffectKind::PanLeft, 1.0), (EffectKind::ZoomIn, 3.0)]);
    let n = w.normalized();
    assert!((n.total() - 100.0).abs() < 1e-9);
    assert!((n.get(EffectKind::ZoomIn) - 75.0).abs() < 1e-9);
}

#[test]
fn all_zero_weights_become_default_but_empty_stays_empty() {
    let zero = EffectWeights::from_pairs(EffectKind::ALL.map(|k| (k, 0.0)));
    assert_eq!(zero.normalized(), EffectWeights::default());
    assert!(EffectWeights::empty().normalized().is_empty());
}

#[test]
fn form_fields_parse_leniently() {
    let fields = [
        ("effect_pan_right", "40"),
        ("effect_zoom_in", "abc"),
        ("effect_spin", "10"),
        ("resolution", "9:16"),
        ("effect_pan_up", " 5 "),
    ];
    let w = EffectWeights::from_form_fields(fields);
    assert_eq!(w.get(EffectKind::PanRight), 40.0);
    assert_eq!(w.get(EffectKind::ZoomIn), 0.0);
    assert_eq!(w.get(EffectKind::PanUp), 5.0);
    assert_eq!(w.iter().count(), 3);
}

#[test]
fn choice_without_weight_is_pan_right() {
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(EffectWeights::empty().choose(&mut rng), EffectKind::PanRight);
    let zero = EffectWeights::from_pairs([(EffectKind::ZoomOut, 0.0)]);
    assert_eq!(zero.choose(&mut rng), EffectKind::PanRight);
}

#[test]
fn choice_respects_single_nonzero_weight() {
    let mut rng = StdRng::seed_from_u64(7);
    let w = EffectWeights::from_pairs([(EffectKind::PanDown, 0.0), (EffectKind::ZoomOut, 5.0)]);
    for _ in 0..50 {
        assert_eq!(w.choose(&mut rng), EffectKind::ZoomOut);
    }
}

#[test]
fn intensity_outside_range_is_rejected() {
    assert!(MotionEffect::new(EffectKind::PanLeft, 0.01).is_err());
    assert!(MotionEffect::new(EffectKind::PanLeft, 0.25).is_err());
    assert!(MotionEffect::new(EffectKind::PanLeft, f64::NAN).is_err());
    assert!(MotionEffect::new(EffectKind::PanLeft, 0.02).is_ok());
    assert!(MotionEffect::new(EffectKind::PanLeft, 0.20).is_ok());
}

#[test]
fn pans_start_centered() {
    for kind in EffectKind::ALL.into_iter().filter(|k| k.is_pan()) {
        let fx = MotionEffect::new(kind, 0.08).unwrap();
        let p = fx.placement_at(0.0, 3.0, PORTRAIT);
        let z = fx.zoom_factor();
        assert!((p.offset_x - (720.0 - 720.0 * z) / 2.0).abs() < 1e-9);
        assert!((p.offset_y - (1280.0 - 1280.0 * z) / 2.0).abs() < 1e-9);
    }
}

#[test]
fn pan_directions_follow_progress() {
    let i = 0.1;
    let z = 1.0 + 3.0 * i;
    let cx = (720.0 - 720.0 * z) / 2.0;
    let cy = (1280.0 - 1280.0 * z) / 2.0;
    let rx = (720.0 * z - 720.0) / 2.0 * 4.0 * i;
    let ry = (1280.0 * z - 1280.0) / 2.0 * 4.0 * i;

    let at = |kind| {
        MotionEffect::new(kind, i)
            .unwrap()
            .placement_at(1.0, 2.0, PORTRAIT)
    };
    assert!((at(EffectKind::PanRight).offset_x - (cx - rx * 0.5)).abs() < 1e-9);
    assert!((at(EffectKind::PanLeft).offset_x - (cx + rx * 0.5)).abs() < 1e-9);
    assert!((at(EffectKind::PanUp).offset_y - (cy + ry * 0.5)).abs() < 1e-9);
    assert!((at(EffectKind::PanDown).offset_y - (cy - ry * 0.5)).abs() < 1e-9);
    assert_eq!(at(EffectKind::PanRight).offset_y, cy);
}

#[test]
fn zoom_scales_between_one_and_factor() {
    let zin = MotionEffect::new(EffectKind::ZoomIn, 0.2).unwrap();
    let zout = MotionEffect::new(EffectKind::ZoomOut, 0.2).unwrap();
    assert_eq!(zin.placement_at(0.0, 4.0, PORTRAIT).scale, 1.0);
    assert!((zin.placement_at(4.0, 4.0, PORTRAIT).scale - 1.6).abs() < 1e-9);
    assert!((zout.placement_at(0.0, 4.0, PORTRAIT).scale - 1.6).abs() < 1e-9);
    assert!((zout.placement_at(4.0, 4.0, PORTRAIT).scale - 1.0).abs() < 1e-9);

    let mid = zin.placement_at(2.0, 4.0, PORTRAIT);
    assert!((mid.offset_x - (720.0 - 720.0 * mid.scale) / 2.0).abs() < 1e-9);
}

#[test]
fn rendered_frames_keep_canvas_size() {
    let src = gradient(72, 128);
    for kind in EffectKind::ALL {
        let fx = MotionEffect::new(kind, 0.08).unwrap();
        for t in [0.0, 0.7, 1.5] {
            let out = fx.render_frame(&src, t, 1.5).unwrap();
            assert_eq!(out.dimensions(), (72, 128));
        }
    }
}

#[test]
fn zoom_in_at_start_reproduces_source() {
    let src = gradient(40, 30);
    let fx = MotionEffect::new(EffectKind::ZoomIn, 0.05).unwrap();
    let out = fx.render_frame(&src, 0.0, 2.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn pans_never_expose_black_borders() {
    let src = RgbaImage::from_pixel(64, 36, Rgba([200, 10, 10, 255]));
    for kind in EffectKind::ALL {
        let fx = MotionEffect::new(kind, 0.20).unwrap();
        let out = fx.render_frame(&src, 3.0, 3.0).unwrap();
        assert!(out.pixels().all(|p| p.0 == [200, 10, 10, 255]), "{kind}");
    }
}
