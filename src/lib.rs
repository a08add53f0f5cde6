//! Folio FX - decorative effects for the portfolio site
//!
//! Core modules:
//! - `sim`: Headless ball physics (state, step, collisions, obstacles, spawning)
//! - `config`: Tunable physics parameters and coordinate space
//! - `reveal`, `scene`, `anchor`, `contact`: Pure logic behind the page effects
//! - `platform`: Browser bindings (DOM, canvas, observers, fetch)

pub mod anchor;
pub mod config;
pub mod contact;
pub mod error;
pub mod platform;
pub mod reveal;
pub mod scene;
pub mod sim;

pub use config::{CoordinateSpace, PhysicsConfig};
pub use error::{FxError, Result};

use glam::Vec2;

/// Effect constants shared by the simulation and the page bindings
pub mod consts {
    /// Nominal frame duration the physics constants are tuned for (60 Hz)
    pub const NOMINAL_FRAME_MS: f64 = 16.67;
    /// Largest frame delta, in nominal frames, applied in a single step
    pub const MAX_DT_SCALE: f32 = 2.0;

    /// Obstacle inset: min(10px, 8% of width) horizontally
    pub const OBSTACLE_INSET_X_PX: f32 = 10.0;
    pub const OBSTACLE_INSET_X_FRACTION: f32 = 0.08;
    /// Obstacle inset: min(10px, 12% of height) vertically
    pub const OBSTACLE_INSET_Y_PX: f32 = 10.0;
    pub const OBSTACLE_INSET_Y_FRACTION: f32 = 0.12;
    /// Obstacles smaller than this after inset are dropped
    pub const OBSTACLE_MIN_WIDTH: f32 = 6.0;
    pub const OBSTACLE_MIN_HEIGHT: f32 = 4.0;

    /// Separation used when two balls sit exactly on top of each other
    pub const MIN_BALL_DISTANCE: f32 = 0.01;
    /// Pixel offset used for the mask normal central difference
    pub const MASK_NORMAL_STEP: i32 = 2;

    /// Reveal stagger between siblings of a reveal group
    pub const REVEAL_STAGGER_MS: u32 = 80;
    /// How long the "Copied!" label stays on a copy button
    pub const COPY_FEEDBACK_MS: i32 = 2000;
    /// How long "Sent!" stays on the contact form's button
    pub const SUBMIT_FEEDBACK_MS: i32 = 4000;
}

/// Squared length below which a vector counts as zero
const EPSILON_SQ: f32 = 1e-8;

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rescale `v` so its length is at most `max`
#[inline]
pub fn clamp_length(v: Vec2, max: f32) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq > max * max && len_sq > EPSILON_SQ {
        v * (max / len_sq.sqrt())
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_length_rescales_uniformly() {
        let v = clamp_length(Vec2::new(30.0, 40.0), 10.0);
        assert!((v.length() - 10.0).abs() < 1e-4);
        assert!((v.x / v.y - 0.75).abs() < 1e-4);
    }

    #[test]
    fn test_clamp_length_leaves_slow_vectors() {
        let v = Vec2::new(1.0, -2.0);
        assert_eq!(clamp_length(v, 10.0), v);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.25), 2.5);
    }
}
