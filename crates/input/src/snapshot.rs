use glam::Vec2;

use crate::keys::KeyMask;

/// Per-frame input handed to the controller script.
///
/// Constructed fresh every frame from the currently held keys plus the
/// previous frame's mask; edge detection needs no deeper history.
#[derive(Debug, Clone, Copy)]
pub struct InputSnapshot {
    /// Keys currently held down.
    pub keys: KeyMask,
    /// Keys newly held since the previous frame.
    pub pressed: KeyMask,
    /// Keys newly released since the previous frame.
    pub released: KeyMask,
    /// Accumulated pointer delta since the last frame; zero when no motion.
    pub mouse_delta: Vec2,
    /// Seconds since the last frame.
    pub dt: f32,
}

impl InputSnapshot {
    /// Derive edge masks from the current mask and the previous frame's.
    pub fn new(keys: KeyMask, prev: KeyMask, mouse_delta: Vec2, dt: f32) -> Self {
        Self {
            keys,
            pressed: KeyMask(keys.bits() & !prev.bits()),
            released: KeyMask(!keys.bits() & prev.bits()),
            mouse_delta,
            dt,
        }
    }
}
