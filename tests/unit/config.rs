use super::*;
use crate::motion::EffectKind;
use rand::SeedableRng;

fn request() -> RenderRequest {
    RenderRequest::default()
}

#[test]
fn canvases_match_aspect_ratios() {
    assert_eq!(AspectRatio::Portrait.canvas(), Canvas { width: 720, height: 1280 });
    assert_eq!(AspectRatio::Landscape.canvas(), Canvas { width: 1280, height: 720 });
    assert_eq!(AspectRatio::Square.canvas(), Canvas { width: 720, height: 720 });
}

#[test]
fn defaults_survive_a_round_through_from_request() {
    let cfg = RenderConfig::from_request(&request());
    assert_eq!(cfg.aspect, AspectRatio::Portrait);
    assert_eq!(cfg.positioning, Positioning::FitScreen);
    assert_eq!(cfg.pause_secs, 0.5);
    assert_eq!(cfg.movement_speed, 8);
    assert_eq!(cfg.encoder, EncoderPreference::Auto);
    assert!(!cfg.enable_motion);
    assert!((cfg.intensity() - 0.08).abs() < 1e-12);
}

#[test]
fn bad_pause_falls_back() {
    for raw in ["-1", "abc", "", "NaN", "inf"] {
        let req = RenderRequest {
            pause_duration: raw.to_string(),
            ..request()
        };
        assert_eq!(RenderConfig::from_request(&req).pause_secs, 0.5, "{raw}");
    }
    let req = RenderRequest {
        pause_duration: "0".to_string(),
        ..request()
    };
    assert_eq!(RenderConfig::from_request(&req).pause_secs, 0.0);
}

#[test]
fn out_of_range_speed_falls_back() {
    for (raw, want) in [("1", 8), ("21", 8), ("x", 8), ("2", 2), ("20", 20), ("12", 12)] {
        let req = RenderRequest {
            movement_speed: raw.to_string(),
            ..request()
        };
        assert_eq!(RenderConfig::from_request(&req).movement_speed, want, "{raw}");
    }
}

#[test]
fn unknown_enumerations_fall_back() {
    let req = RenderRequest {
        resolution: "4:3".to_string(),
        image_positioning: "stretch".to_string(),
        gpu_acceleration: "matrox".to_string(),
        ..request()
    };
    let cfg = RenderConfig::from_request(&req);
    assert_eq!(cfg.aspect, AspectRatio::Portrait);
    assert_eq!(cfg.positioning, Positioning::FitScreen);
    assert_eq!(cfg.encoder, EncoderPreference::Auto);

    assert_eq!(EncoderPreference::parse_lenient(" NVIDIA "), EncoderPreference::Nvidia);
}

#[test]
fn motion_weights_are_normalized_from_form_fields() {
    let mut req = RenderRequest {
        enable_movement: true,
        ..request()
    };
    req.effect_fields
        .insert("effect_zoom_in".to_string(), "30".to_string());
    req.effect_fields
        .insert("effect_pan_left".to_string(), "10".to_string());
    let cfg = RenderConfig::from_request(&req);
    assert!((cfg.effect_weights.total() - 100.0).abs() < 1e-9);
    assert!((cfg.effect_weights.get(EffectKind::ZoomIn) - 75.0).abs() < 1e-9);
}

#[test]
fn motion_without_weights_picks_pan_right() {
    let req = RenderRequest {
        enable_movement: true,
        ..request()
    };
    let weights = RenderConfig::from_request(&req).effect_weights;
    assert!(weights.is_empty());
    let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    assert_eq!(weights.choose(&mut rng), EffectKind::PanRight);
}

#[test]
fn all_zero_form_weights_use_default_distribution() {
    let mut req = RenderRequest {
        enable_movement: true,
        ..request()
    };
    for kind in EffectKind::ALL {
        req.effect_fields
            .insert(format!("effect_{kind}"), "0".to_string());
    }
    assert_eq!(
        RenderConfig::from_request(&req).effect_weights,
        EffectWeights::default()
    );
}

#[test]
fn sanitized_clamps_direct_construction() {
    let cfg = RenderConfig {
        pause_secs: -3.0,
        movement_speed: 90,
        enable_motion: true,
        effect_weights: EffectWeights::empty(),
        ..RenderConfig::default()
    }
    .sanitized();
    assert_eq!(cfg.pause_secs, 0.5);
    assert_eq!(cfg.movement_speed, 8);
    assert!(cfg.effect_weights.is_empty());
}

#[test]
fn preference_catalog_lists_five_options() {
    let options = encoder_preference_options();
    assert_eq!(options.len(), 5);
    assert_eq!(options[0].value, "auto");
    assert_eq!(options[1].label, "CPU Only (libx264)");
    assert_eq!(EncoderPreference::Auto.fixed_codec(), None);
    assert_eq!(EncoderPreference::Amd.fixed_codec(), Some(Codec::H264Amf));
}

#[test]
fn app_config_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let mut cfg = AppConfig::default();
    cfg.output_folder = dir.path().join("out");
    cfg.logging.json = true;
    cfg.probe.validation_secs = 3;

    let written = cfg.save(Some(&path)).unwrap();
    assert_eq!(written, path);
    assert_eq!(AppConfig::load(Some(&path)), cfg);
}

#[test]
fn invalid_or_partial_config_files() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{ not json").unwrap();
    assert_eq!(AppConfig::load(Some(&bad)), AppConfig::default());

    let partial = dir.path().join("partial.json");
    std::fs::write(&partial, r#"{"output_folder": "renders"}"#).unwrap();
    let cfg = AppConfig::load(Some(&partial));
    assert_eq!(cfg.output_folder, PathBuf::from("renders"));
    assert_eq!(cfg.probe, ProbeTimeouts::default());
    assert_eq!(cfg.defaults.resolution, "9:16");
}

#[test]
fn aspect_serializes_as_ratio_string() {
    assert_eq!(serde_json::to_value(AspectRatio::Landscape).unwrap(), "16:9");
    let cfg: RenderConfig = serde_json::from_str(
        r#"{"aspect":"1:1","positioning":"center_blur","enable_motion":false,
            "effect_weights":{},"pause_secs":0.0,"movement_speed":5,"encoder":"cpu"}"#,
    )
    .unwrap();
    assert_eq!(cfg.aspect, AspectRatio::Square);
    assert_eq!(cfg.encoder, EncoderPreference::Cpu);
}
