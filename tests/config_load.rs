use avatar_engine::config::AvatarConfig;
use avatar_engine::emotion::EmotionState;
use std::fs;

#[test]
fn defaults_match_the_tuned_values() {
    let cfg = AvatarConfig::default();
    assert!((cfg.fade.fade_duration - 0.4).abs() < 1e-6);
    assert!((cfg.fade.settle_gap - 0.15).abs() < 1e-6);
    assert!((cfg.fade.one_shot_return_pause - 0.25).abs() < 1e-6);
    assert_eq!(cfg.talking.variants, vec!["talking_01", "talking_02", "talking_03"]);
    assert_eq!(cfg.talking.fallback_key, "talking");
    assert!((cfg.talking.gap - 1.2).abs() < 1e-6);
    assert!((cfg.cache.ttl_seconds - 300.0).abs() < 1e-3);
    assert!((cfg.cache.sweep_interval - 60.0).abs() < 1e-3);
    assert!((cfg.pointer.blend - 0.06).abs() < 1e-6);
    assert!((cfg.pointer.tilt_limit - 0.25).abs() < 1e-6);
    assert!((cfg.pointer.turn_limit - 0.32).abs() < 1e-6);
    assert!((cfg.model.min_opacity - 0.85).abs() < 1e-6);
    assert_eq!(cfg.model.position, [0.0, -0.95, 0.0]);
}

#[test]
fn partial_config_keeps_defaults_for_omitted_fields() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("avatar.json");
    fs::write(
        &path,
        r#"{
            "fade": { "fade_duration": 0.8 },
            "talking": { "variants": ["speak_a", "speak_b"] },
            "pointer": { "turn_limit": 0.5 }
        }"#,
    )
    .expect("write config");

    let cfg = AvatarConfig::load(&path).expect("config parses");
    assert!((cfg.fade.fade_duration - 0.8).abs() < 1e-6);
    assert!((cfg.fade.settle_gap - 0.15).abs() < 1e-6, "omitted field lost its default");
    assert_eq!(cfg.talking.variants, vec!["speak_a", "speak_b"]);
    assert_eq!(cfg.talking.fallback_key, "talking");
    assert!((cfg.pointer.turn_limit - 0.5).abs() < 1e-6);
    assert!((cfg.pointer.tilt_limit - 0.25).abs() < 1e-6);
}

#[test]
fn load_or_default_swallows_missing_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let cfg = AvatarConfig::load_or_default(dir.path().join("nope.json"));
    assert!((cfg.fade.fade_duration - 0.4).abs() < 1e-6);
}

#[test]
fn load_or_default_swallows_malformed_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").expect("write config");
    let cfg = AvatarConfig::load_or_default(&path);
    assert!((cfg.cache.ttl_seconds - 300.0).abs() < 1e-3);
}

#[test]
fn load_rejects_malformed_files_with_context() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").expect("write config");
    let err = AvatarConfig::load(&path).expect_err("parse should fail");
    assert!(format!("{err:#}").contains("broken.json"));
}

#[test]
fn lighting_hints_prefer_configured_overrides() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("avatar.json");
    fs::write(
        &path,
        r#"{ "lighting": { "sad": { "intensity": 0.3, "color": [1.0, 0.0, 0.0] } } }"#,
    )
    .expect("write config");

    let cfg = AvatarConfig::load(&path).expect("config parses");
    let sad = cfg.lighting_hint(EmotionState::Sad);
    assert!((sad.intensity - 0.3).abs() < 1e-6);
    assert_eq!(sad.color, [1.0, 0.0, 0.0]);

    // Unconfigured states fall back to the built-in table.
    let happy = cfg.lighting_hint(EmotionState::Happy);
    assert!(happy.intensity > 1.0);
    let neutral = cfg.lighting_hint(EmotionState::Neutral);
    assert!((neutral.intensity - 1.0).abs() < 1e-6);
}
