use crate::config::PointerConfig;
use glam::Vec2;

/// Smooths normalized pointer input into head (tilt, turn) targets. Runs on
/// the render tick, fully decoupled from emotion and playback state.
pub struct PointerOrientation {
    cfg: PointerConfig,
    target: Vec2,
    current: Vec2,
}

impl PointerOrientation {
    pub fn new(cfg: PointerConfig) -> Self {
        Self { cfg, target: Vec2::ZERO, current: Vec2::ZERO }
    }

    /// Records a new target from normalized (0..1, 0..1) pointer coordinates.
    /// x maps to turn, y to tilt; (0.5, 0.5) is dead center.
    pub fn update_pointer(&mut self, x: f32, y: f32) {
        let x = x.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);
        let tilt = (0.5 - y) * 2.0 * self.cfg.tilt_limit;
        let turn = (x - 0.5) * 2.0 * self.cfg.turn_limit;
        self.target = Vec2::new(tilt, turn);
    }

    pub fn reset_pointer(&mut self) {
        self.target = Vec2::ZERO;
    }

    /// Moves the current orientation toward the target by the configured
    /// blend factor, then clamps. Clamping runs after every update so the
    /// output never exceeds the limits at any intermediate tick.
    pub fn tick(&mut self) {
        self.current += (self.target - self.current) * self.cfg.blend;
        self.current.x = self.current.x.clamp(-self.cfg.tilt_limit, self.cfg.tilt_limit);
        self.current.y = self.current.y.clamp(-self.cfg.turn_limit, self.cfg.turn_limit);
    }

    pub fn tilt(&self) -> f32 {
        self.current.x
    }

    pub fn turn(&self) -> f32 {
        self.current.y
    }

    /// Smoothed (tilt, turn) pair in radians.
    pub fn head_orientation(&self) -> Vec2 {
        self.current
    }
}
