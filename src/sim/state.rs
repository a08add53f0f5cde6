//! Simulation state and ball entities
//!
//! Everything the step engine reads or mutates lives in [`SimState`]; the
//! browser layer owns one instance and passes it into every step.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::PhysicsConfig;

/// Ball lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BallPhase {
    /// Simulated normally
    Active,
    /// Out of the simulation, waiting for its fade to finish
    Fading { remaining_ms: f64 },
}

/// A ball entity
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Position at the start of the current step (mask rollback target)
    pub prev_pos: Vec2,
    /// Rotation (radians)
    pub angle: f32,
    /// Extra rotation per nominal frame (radians)
    pub spin: f32,
    pub phase: BallPhase,
    /// Time spent below the stop threshold
    pub rest_ms: f64,
    /// Remaining impact highlight time
    pub impact_ms: f64,
}

/// Presentation flags derived from a ball's state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallVisual {
    pub pos: Vec2,
    /// Rotation in degrees, ready for a CSS transform
    pub rotation_deg: f32,
    /// Direction of travel in degrees (0 = moving right, 90 = moving down)
    pub travel_deg: f32,
    /// Stretch along the direction of travel (1.0 = round)
    pub stretch: f32,
    pub fast: bool,
    pub resting: bool,
    pub impact: bool,
    pub fading: bool,
    /// 1.0 while active, ramps to 0.0 over the fade
    pub opacity: f32,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, spin: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            prev_pos: pos,
            angle: 0.0,
            spin,
            phase: BallPhase::Active,
            rest_ms: 0.0,
            impact_ms: 0.0,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, BallPhase::Active)
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Position and velocity are usable numbers
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }

    /// Start the impact highlight
    pub fn mark_impact(&mut self, config: &PhysicsConfig) {
        self.impact_ms = config.impact_ms;
    }

    /// Derive presentation state
    pub fn visual(&self, config: &PhysicsConfig) -> BallVisual {
        let speed = self.speed();
        let (fading, opacity) = match self.phase {
            BallPhase::Active => (false, 1.0),
            BallPhase::Fading { remaining_ms } => {
                let t = if config.fade_ms > 0.0 {
                    (remaining_ms / config.fade_ms).clamp(0.0, 1.0) as f32
                } else {
                    0.0
                };
                (true, t)
            }
        };
        BallVisual {
            pos: self.pos,
            rotation_deg: self.angle.to_degrees(),
            travel_deg: if speed > 0.0 {
                self.vel.y.atan2(self.vel.x).to_degrees()
            } else {
                0.0
            },
            stretch: 1.0 + (speed / config.max_speed).min(1.0) * 0.15,
            fast: speed > config.fast_speed,
            resting: self.rest_ms > 0.0 && speed < config.stop_threshold,
            impact: self.impact_ms > 0.0,
            fading,
            opacity,
        }
    }
}

/// Something the renderer needs to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// New ball; create its element
    Spawned(u32),
    /// Ball started fading out
    Faded(u32),
    /// Ball is gone; drop its element
    Removed(u32),
}

/// Simulation extent in the configured coordinate space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct SimState {
    pub config: PhysicsConfig,
    /// Tracked balls, oldest first
    pub balls: Vec<Ball>,
    /// Cursor position, if the pointer is over the page
    pub cursor: Option<Vec2>,
    /// Timestamp of the previous step (None right after a (re)start)
    pub last_frame_ms: Option<f64>,
    /// Whether the frame loop should be scheduled
    pub running: bool,
    pub rng: Pcg32,
    /// Next entity ID
    next_id: u32,
}

impl SimState {
    pub fn new(config: PhysicsConfig, seed: u64) -> Self {
        Self {
            config,
            balls: Vec::new(),
            cursor: None,
            last_frame_ms: None,
            running: false,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn set_cursor(&mut self, pos: Option<Vec2>) {
        self.cursor = pos;
    }

    /// Stop the loop and forget frame timing
    pub fn halt(&mut self) {
        self.running = false;
        self.last_frame_ms = None;
    }
}
