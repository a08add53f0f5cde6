//! Physics configuration
//!
//! Defaults are tuned for a 60 Hz frame; velocities are in pixels per nominal
//! frame and accelerations in pixels per nominal frame squared. Pages can
//! override any field with an inline JSON block (see [`PhysicsConfig::load`]).

use serde::{Deserialize, Serialize};

use crate::error::{FxError, Result};

/// Which coordinate system balls live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// Fixed-position balls pinned to the viewport
    #[default]
    Viewport,
    /// Absolute-position balls that scroll with the page
    Document,
}

impl CoordinateSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateSpace::Viewport => "viewport",
            CoordinateSpace::Document => "document",
        }
    }

    /// Ball cap that suits this space (the page variant has more room)
    pub fn default_max_balls(&self) -> usize {
        match self {
            CoordinateSpace::Viewport => 15,
            CoordinateSpace::Document => 20,
        }
    }

    /// CSS `position` value for ball elements
    pub fn css_position(&self) -> &'static str {
        match self {
            CoordinateSpace::Viewport => "fixed",
            CoordinateSpace::Document => "absolute",
        }
    }

    /// Convert a client (viewport) point into this space
    pub fn from_client(&self, x: f32, y: f32, scroll_x: f32, scroll_y: f32) -> (f32, f32) {
        match self {
            CoordinateSpace::Viewport => (x, y),
            CoordinateSpace::Document => (x + scroll_x, y + scroll_y),
        }
    }
}

/// Tunable physics parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Coordinate space for balls, obstacles and cursor
    pub space: CoordinateSpace,
    /// Maximum number of tracked balls (defaults to the space's cap)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_balls: Option<usize>,
    /// Ball radius (px)
    pub ball_radius: f32,

    // === Forces ===
    /// Downward acceleration per nominal frame
    pub gravity: f32,
    /// Velocity retained per nominal frame (air resistance)
    pub air_resistance: f32,
    /// Hard speed cap
    pub max_speed: f32,

    // === Collisions ===
    /// Restitution against walls and obstacles
    pub bounce: f32,
    /// Restitution between two balls
    pub ball_restitution: f32,
    /// Speeds below this snap to zero after a bounce, and count as resting
    pub stop_threshold: f32,
    /// Mask alpha at or below this is transparent
    pub alpha_threshold: u8,
    /// Let balls fall through the bottom edge instead of bouncing
    pub open_floor: bool,

    // === Cursor magnet ===
    pub magnet_enabled: bool,
    /// Attraction only applies inside this distance
    pub magnet_radius: f32,
    /// No attraction closer than this (avoids the singularity)
    pub magnet_min_distance: f32,
    /// Acceleration is `magnet_strength / distance`
    pub magnet_strength: f32,

    // === Spawning ===
    /// Speed of the radial burst pattern
    pub launch_speed: f32,
    /// Uniform jitter added to every launch velocity component
    pub launch_jitter: f32,

    // === Lifetimes (ms) ===
    /// Time below the stop threshold before a ball fades out
    pub rest_timeout_ms: f64,
    /// Fade-out duration before removal
    pub fade_ms: f64,
    /// Duration of the impact highlight
    pub impact_ms: f64,
    /// Distance below the floor after which a ball is removed
    pub fall_out_margin: f32,

    // === Presentation ===
    /// Speed above which a ball is flagged as fast
    pub fast_speed: f32,
    /// Obstacle geometry cache lifetime
    pub obstacle_ttl_ms: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::for_space(CoordinateSpace::default())
    }
}

impl PhysicsConfig {
    /// Defaults for a coordinate space (applies its ball cap)
    pub fn for_space(space: CoordinateSpace) -> Self {
        Self {
            space,
            max_balls: None,
            ball_radius: 10.0,

            gravity: 0.5,
            air_resistance: 0.995,
            max_speed: 25.0,

            bounce: 0.7,
            ball_restitution: 0.85,
            stop_threshold: 0.5,
            alpha_threshold: 50,
            open_floor: false,

            magnet_enabled: true,
            magnet_radius: 180.0,
            magnet_min_distance: 30.0,
            magnet_strength: 12.0,

            launch_speed: 12.0,
            launch_jitter: 1.0,

            rest_timeout_ms: 3000.0,
            fade_ms: 600.0,
            impact_ms: 150.0,
            fall_out_margin: 200.0,

            fast_speed: 15.0,
            obstacle_ttl_ms: 100.0,
        }
    }

    /// Parse JSON overrides on top of the defaults, then validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the step engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.ball_cap() == 0 {
            return Err(FxError::InvalidConfig("max_balls must be at least 1".into()));
        }
        if !(self.ball_radius > 0.0) {
            return Err(FxError::InvalidConfig("ball_radius must be positive".into()));
        }
        if !(self.max_speed > 0.0) {
            return Err(FxError::InvalidConfig("max_speed must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.bounce) || !(0.0..=1.0).contains(&self.ball_restitution) {
            return Err(FxError::InvalidConfig("restitution must be within 0..=1".into()));
        }
        if !(self.air_resistance > 0.0 && self.air_resistance <= 1.0) {
            return Err(FxError::InvalidConfig("air_resistance must be within (0, 1]".into()));
        }
        if !(self.launch_speed > 0.0) || self.launch_jitter < 0.0 {
            return Err(FxError::InvalidConfig("launch speed must be positive".into()));
        }
        if self.magnet_min_distance < 0.0 || self.magnet_radius < self.magnet_min_distance {
            return Err(FxError::InvalidConfig(
                "magnet_radius must exceed magnet_min_distance".into(),
            ));
        }
        Ok(())
    }

    /// Maximum number of tracked balls, never below one
    #[inline]
    pub fn ball_cap(&self) -> usize {
        self.max_balls
            .unwrap_or_else(|| self.space.default_max_balls())
            .max(1)
    }

    /// Combined radius of two touching balls
    #[inline]
    pub fn contact_distance(&self) -> f32 {
        self.ball_radius * 2.0
    }

    /// Element id of the inline JSON override block
    const CONFIG_ELEMENT_ID: &'static str = "physics-config";

    /// Load overrides from the page's inline JSON block (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = text {
            match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded physics config ({} space)", config.space.as_str());
                    return config;
                }
                Err(e) => log::warn!("Ignoring #{}: {}", Self::CONFIG_ELEMENT_ID, e),
            }
        }

        log::info!("Using default physics config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No #{} outside the browser", Self::CONFIG_ELEMENT_ID);
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_caps() {
        assert_eq!(PhysicsConfig::for_space(CoordinateSpace::Viewport).ball_cap(), 15);
        assert_eq!(PhysicsConfig::for_space(CoordinateSpace::Document).ball_cap(), 20);
    }

    #[test]
    fn test_from_json_overrides_only_given_fields() {
        let config = PhysicsConfig::from_json(r#"{"space":"document","gravity":0.8}"#).unwrap();
        assert_eq!(config.space, CoordinateSpace::Document);
        assert_eq!(config.ball_cap(), 20);
        assert_eq!(config.gravity, 0.8);
        assert_eq!(config.ball_radius, 10.0);
    }

    #[test]
    fn test_explicit_cap_wins_over_space_default() {
        let config = PhysicsConfig::from_json(r#"{"space":"document","max_balls":5}"#).unwrap();
        assert_eq!(config.ball_cap(), 5);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            PhysicsConfig::from_json(r#"{"bounce":1.5}"#),
            Err(FxError::InvalidConfig(_))
        ));
        assert!(matches!(
            PhysicsConfig::from_json(r#"{"max_balls":0}"#),
            Err(FxError::InvalidConfig(_))
        ));
        assert!(matches!(
            PhysicsConfig::from_json("not json"),
            Err(FxError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_document_space_offsets_by_scroll() {
        let space = CoordinateSpace::Document;
        assert_eq!(space.from_client(10.0, 20.0, 0.0, 300.0), (10.0, 320.0));
        let space = CoordinateSpace::Viewport;
        assert_eq!(space.from_client(10.0, 20.0, 0.0, 300.0), (10.0, 20.0));
    }

    #[test]
    fn test_zero_cap_built_in_code_still_holds_one_ball() {
        let config = PhysicsConfig {
            max_balls: Some(0),
            ..PhysicsConfig::default()
        };
        assert_eq!(config.ball_cap(), 1);
    }
}
