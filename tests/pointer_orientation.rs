use avatar_engine::config::PointerConfig;
use avatar_engine::pointer::PointerOrientation;

fn settle(pointer: &mut PointerOrientation, ticks: usize) {
    for _ in 0..ticks {
        pointer.tick();
    }
}

#[test]
fn center_pointer_maps_to_zero_orientation() {
    let mut pointer = PointerOrientation::new(PointerConfig::default());
    pointer.update_pointer(0.5, 0.5);
    settle(&mut pointer, 500);
    assert!(pointer.tilt().abs() < 1e-4);
    assert!(pointer.turn().abs() < 1e-4);
}

#[test]
fn corner_pointer_converges_to_the_limits() {
    let cfg = PointerConfig::default();
    let mut pointer = PointerOrientation::new(cfg.clone());
    // Bottom-right corner: look down and to the right.
    pointer.update_pointer(1.0, 1.0);
    settle(&mut pointer, 500);
    assert!((pointer.tilt() - (-cfg.tilt_limit)).abs() < 1e-3, "tilt was {}", pointer.tilt());
    assert!((pointer.turn() - cfg.turn_limit).abs() < 1e-3, "turn was {}", pointer.turn());
}

#[test]
fn orientation_never_exceeds_the_limits_mid_flight() {
    let cfg = PointerConfig::default();
    let mut pointer = PointerOrientation::new(cfg.clone());
    pointer.update_pointer(0.0, 0.0);
    for _ in 0..500 {
        pointer.tick();
        assert!(pointer.tilt().abs() <= cfg.tilt_limit + 1e-6);
        assert!(pointer.turn().abs() <= cfg.turn_limit + 1e-6);
    }
}

#[test]
fn out_of_range_input_is_clamped_to_the_viewport() {
    let cfg = PointerConfig::default();
    let mut pointer = PointerOrientation::new(cfg.clone());
    pointer.update_pointer(7.0, -3.0);
    settle(&mut pointer, 500);
    // Same as the (1.0, 0.0) corner.
    assert!((pointer.tilt() - cfg.tilt_limit).abs() < 1e-3);
    assert!((pointer.turn() - cfg.turn_limit).abs() < 1e-3);
}

#[test]
fn reset_returns_smoothly_to_center() {
    let mut pointer = PointerOrientation::new(PointerConfig::default());
    pointer.update_pointer(1.0, 1.0);
    settle(&mut pointer, 500);
    assert!(pointer.turn().abs() > 0.3);

    pointer.reset_pointer();
    // One tick moves only a blend-fraction of the way back.
    pointer.tick();
    assert!(pointer.turn().abs() > 0.25, "reset must not snap");
    settle(&mut pointer, 500);
    assert!(pointer.tilt().abs() < 1e-3);
    assert!(pointer.turn().abs() < 1e-3);
}

#[test]
fn head_orientation_packs_tilt_then_turn() {
    let mut pointer = PointerOrientation::new(PointerConfig::default());
    pointer.update_pointer(1.0, 0.5);
    settle(&mut pointer, 500);
    let orientation = pointer.head_orientation();
    assert!((orientation.x - pointer.tilt()).abs() < 1e-6);
    assert!((orientation.y - pointer.turn()).abs() < 1e-6);
    assert!(orientation.x.abs() < 1e-3, "tilt should be neutral at y = 0.5");
    assert!(orientation.y > 0.3, "turn should be near the right limit");
}
