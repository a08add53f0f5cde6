//! Ball physics simulation
//!
//! Pure and headless: no DOM access happens here. The browser layer feeds in
//! clicks, cursor position, obstacle geometry and frame timestamps, and
//! applies the resulting positions and events to the page.
//! - Seeded RNG only
//! - Stable iteration order (oldest ball first)

pub mod collision;
pub mod obstacle;
pub mod spawn;
pub mod state;
pub mod step;

pub use collision::{
    HitAxis, ball_ball_collision, ball_bounds_collision, ball_mask_collision,
    ball_obstacle_collision, ball_rect_collision, bounce_component, reflect_velocity,
};
pub use obstacle::{AlphaMask, Obstacle, ObstacleCache, ObstacleSource, Rect};
pub use spawn::LaunchPattern;
pub use state::{Ball, BallPhase, BallVisual, Bounds, SimEvent, SimState};
pub use step::{StepOutcome, frame_scale, step};
