//! Per-frame physics step
//!
//! Advances every ball once per display refresh. Physics constants are tuned
//! for a nominal 60 Hz frame; the step scales by the real elapsed time so the
//! toy behaves the same on fast and slow displays.

use glam::Vec2;

use super::collision::{ball_ball_collision, ball_bounds_collision, ball_obstacle_collision};
use super::obstacle::Obstacle;
use super::state::{Ball, BallPhase, Bounds, SimEvent, SimState};
use crate::clamp_length;
use crate::config::PhysicsConfig;
use crate::consts::*;

/// Impacts slower than this don't flash
const IMPACT_MIN_SPEED: f32 = 3.0;

/// What a step produced
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    /// Fades and removals, in the order they happened
    pub events: Vec<SimEvent>,
    /// Whether another frame should be scheduled
    pub keep_running: bool,
}

/// Elapsed time in nominal frames, capped at [`MAX_DT_SCALE`]
///
/// `None` (first frame after a start) counts as one nominal frame.
pub fn frame_scale(elapsed_ms: Option<f64>) -> f32 {
    match elapsed_ms {
        Some(ms) => ((ms / NOMINAL_FRAME_MS) as f32).clamp(0.0, MAX_DT_SCALE),
        None => 1.0,
    }
}

/// Advance the simulation to `now_ms`
pub fn step(state: &mut SimState, obstacles: &[Obstacle], bounds: Bounds, now_ms: f64) -> StepOutcome {
    let elapsed = state.last_frame_ms.map(|last| now_ms - last);
    state.last_frame_ms = Some(now_ms);
    let dt = frame_scale(elapsed);
    // Timers run on the same clamped clock as the physics
    let dt_ms = dt as f64 * NOMINAL_FRAME_MS;

    let config = &state.config;
    let balls = &mut state.balls;
    let cursor = state.cursor;

    // Forces and integration
    for ball in balls.iter_mut().filter(|b| b.is_active()) {
        integrate(ball, config, cursor, dt);
    }

    // Obstacles
    for ball in balls.iter_mut().filter(|b| b.is_active()) {
        let speed = ball.speed();
        let mut hit = false;
        for obstacle in obstacles {
            hit |= ball_obstacle_collision(ball, obstacle, config);
        }
        if hit && speed > IMPACT_MIN_SPEED {
            ball.mark_impact(config);
        }
    }

    // Ball pairs
    for i in 0..balls.len() {
        let (head, tail) = balls.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.is_active() {
            continue;
        }
        for b in tail.iter_mut().filter(|b| b.is_active()) {
            let closing = (a.vel - b.vel).length();
            if ball_ball_collision(a, b, config) && closing > IMPACT_MIN_SPEED {
                a.mark_impact(config);
                b.mark_impact(config);
            }
        }
    }

    // Page edges
    for ball in balls.iter_mut().filter(|b| b.is_active()) {
        let speed = ball.speed();
        if ball_bounds_collision(ball, bounds.width, bounds.height, config) && speed > IMPACT_MIN_SPEED {
            ball.mark_impact(config);
        }
    }

    // Lifetimes
    let mut events = Vec::new();
    let fall_line = bounds.height + config.fall_out_margin;
    balls.retain_mut(|ball| {
        if !ball.is_finite() {
            log::warn!("Dropping ball {} with non-finite state", ball.id);
            events.push(SimEvent::Removed(ball.id));
            return false;
        }
        if ball.pos.y > fall_line {
            log::debug!("Ball {} fell off the page", ball.id);
            events.push(SimEvent::Removed(ball.id));
            return false;
        }

        ball.impact_ms = (ball.impact_ms - dt_ms).max(0.0);
        match ball.phase {
            BallPhase::Active => {
                ball.vel = clamp_length(ball.vel, config.max_speed);
                if ball.speed() < config.stop_threshold {
                    ball.rest_ms += dt_ms;
                    if ball.rest_ms >= config.rest_timeout_ms {
                        ball.vel = Vec2::ZERO;
                        ball.phase = BallPhase::Fading {
                            remaining_ms: config.fade_ms,
                        };
                        events.push(SimEvent::Faded(ball.id));
                    }
                } else {
                    ball.rest_ms = 0.0;
                }
                true
            }
            BallPhase::Fading { remaining_ms } => {
                let remaining_ms = remaining_ms - dt_ms;
                if remaining_ms <= 0.0 {
                    events.push(SimEvent::Removed(ball.id));
                    false
                } else {
                    ball.phase = BallPhase::Fading { remaining_ms };
                    true
                }
            }
        }
    });

    let keep_running = !state.balls.is_empty();
    if keep_running {
        state.running = true;
    } else {
        state.halt();
    }

    StepOutcome {
        events,
        keep_running,
    }
}

/// Apply forces to one ball and move it
fn integrate(ball: &mut Ball, config: &PhysicsConfig, cursor: Option<Vec2>, dt: f32) {
    ball.prev_pos = ball.pos;

    if config.magnet_enabled {
        if let Some(cursor) = cursor {
            ball.vel += magnet_acceleration(ball.pos, cursor, config) * dt;
        }
    }

    ball.vel.y += config.gravity * dt;
    ball.vel *= config.air_resistance.powf(dt);
    ball.vel = clamp_length(ball.vel, config.max_speed);

    ball.pos += ball.vel * dt;
    ball.angle += (ball.vel.x / config.ball_radius + ball.spin) * dt;
}

/// Pull toward the cursor, inversely proportional to distance
pub fn magnet_acceleration(pos: Vec2, cursor: Vec2, config: &PhysicsConfig) -> Vec2 {
    let to_cursor = cursor - pos;
    let dist = to_cursor.length();
    if dist <= config.magnet_min_distance || dist >= config.magnet_radius {
        return Vec2::ZERO;
    }
    to_cursor / dist * (config.magnet_strength / dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacle::{AlphaMask, Rect};
    use proptest::prelude::*;
    use std::rc::Rc;

    const FRAME: f64 = 16.67;

    fn quiet_config() -> PhysicsConfig {
        PhysicsConfig {
            magnet_enabled: false,
            rest_timeout_ms: 1.0e9,
            ..PhysicsConfig::default()
        }
    }

    fn run(state: &mut SimState, obstacles: &[Obstacle], bounds: Bounds, frames: usize) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let mut now = state.last_frame_ms.unwrap_or(0.0);
        for _ in 0..frames {
            now += FRAME;
            events.extend(step(state, obstacles, bounds, now).events);
        }
        events
    }

    #[test]
    fn test_frame_scale() {
        assert_eq!(frame_scale(None), 1.0);
        assert!((frame_scale(Some(16.67)) - 1.0).abs() < 1e-6);
        assert!((frame_scale(Some(8.335)) - 0.5).abs() < 1e-6);
        assert_eq!(frame_scale(Some(500.0)), MAX_DT_SCALE);
        assert_eq!(frame_scale(Some(-5.0)), 0.0);
    }

    #[test]
    fn test_ball_settles_on_obstacle_top() {
        let mut state = SimState::new(quiet_config(), 1);
        state.balls.push(Ball::new(1, Vec2::new(250.0, 300.0), Vec2::ZERO, 0.0));
        let obstacles = [Obstacle::Rect(Rect::new(100.0, 500.0, 400.0, 600.0))];

        run(&mut state, &obstacles, Bounds::new(800.0, 1000.0), 600);

        let ball = &state.balls[0];
        assert!((ball.pos.y - 490.0).abs() < 1e-3, "y = {}", ball.pos.y);
        assert_eq!(ball.vel, Vec2::ZERO);
        assert_eq!(ball.pos.x, 250.0);
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut state = SimState::new(quiet_config(), 1);
        state.balls.push(Ball::new(1, Vec2::new(100.0, 100.0), Vec2::ZERO, 0.0));
        step(&mut state, &[], Bounds::new(800.0, 600.0), 0.0);
        assert!(state.balls[0].vel.y > 0.0);
        assert!(state.balls[0].pos.y > 100.0);
        assert_eq!(state.balls[0].prev_pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_magnet_range() {
        let config = PhysicsConfig::default();
        let cursor = Vec2::new(0.0, 0.0);
        // Too close
        assert_eq!(magnet_acceleration(Vec2::new(10.0, 0.0), cursor, &config), Vec2::ZERO);
        // Too far
        assert_eq!(magnet_acceleration(Vec2::new(500.0, 0.0), cursor, &config), Vec2::ZERO);
        // In range: points at the cursor, weaker further away
        let near = magnet_acceleration(Vec2::new(60.0, 0.0), cursor, &config);
        let far = magnet_acceleration(Vec2::new(120.0, 0.0), cursor, &config);
        assert!(near.x < 0.0);
        assert!((near.length() - 2.0 * far.length()).abs() < 1e-5);
    }

    #[test]
    fn test_resting_ball_fades_then_is_removed() {
        let config = PhysicsConfig {
            magnet_enabled: false,
            rest_timeout_ms: 500.0,
            fade_ms: 200.0,
            ..PhysicsConfig::default()
        };
        let mut state = SimState::new(config, 1);
        state.balls.push(Ball::new(1, Vec2::new(100.0, 590.0), Vec2::ZERO, 0.0));
        let bounds = Bounds::new(800.0, 600.0);

        let events = run(&mut state, &[], bounds, 40);
        assert!(events.contains(&SimEvent::Faded(1)));
        assert!(!state.balls[0].is_active());

        let events = run(&mut state, &[], bounds, 20);
        assert_eq!(events, vec![SimEvent::Removed(1)]);
        assert!(state.balls.is_empty());
        assert!(!state.running);
        assert_eq!(state.last_frame_ms, None);
    }

    #[test]
    fn test_ball_falling_past_open_floor_is_removed() {
        let config = PhysicsConfig {
            open_floor: true,
            ..quiet_config()
        };
        let mut state = SimState::new(config, 1);
        state.balls.push(Ball::new(1, Vec2::new(100.0, 550.0), Vec2::new(0.0, 20.0), 0.0));

        let events = run(&mut state, &[], Bounds::new(800.0, 600.0), 30);
        assert_eq!(events, vec![SimEvent::Removed(1)]);
    }

    #[test]
    fn test_loop_stops_when_empty() {
        let mut state = SimState::new(quiet_config(), 1);
        state.running = true;
        let outcome = step(&mut state, &[], Bounds::new(800.0, 600.0), 10.0);
        assert!(!outcome.keep_running);
        assert!(!state.running);
        assert_eq!(state.last_frame_ms, None);
    }

    #[test]
    fn test_non_finite_ball_is_dropped() {
        let mut state = SimState::new(quiet_config(), 1);
        state.balls.push(Ball::new(1, Vec2::new(f32::NAN, 10.0), Vec2::ZERO, 0.0));
        let outcome = step(&mut state, &[], Bounds::new(800.0, 600.0), 0.0);
        assert_eq!(outcome.events, vec![SimEvent::Removed(1)]);
    }

    #[test]
    fn test_fading_ball_ignores_collisions() {
        let mut state = SimState::new(quiet_config(), 1);
        let mut ghost = Ball::new(1, Vec2::new(100.0, 100.0), Vec2::ZERO, 0.0);
        ghost.phase = BallPhase::Fading { remaining_ms: 1000.0 };
        state.balls.push(ghost);
        state.balls.push(Ball::new(2, Vec2::new(105.0, 100.0), Vec2::ZERO, 0.0));

        step(&mut state, &[], Bounds::new(800.0, 600.0), 0.0);
        assert_eq!(state.balls[0].pos, Vec2::new(100.0, 100.0));
        assert_eq!(state.balls[1].pos.x, 105.0);
    }

    #[test]
    fn test_ball_spawned_inside_mask_falls_free() {
        let mut state = SimState::new(quiet_config(), 1);
        state.balls.push(Ball::new(1, Vec2::new(150.0, 150.0), Vec2::ZERO, 0.0));
        let mask = AlphaMask::new(10, 10, vec![255; 100]).unwrap();
        let obstacles = [Obstacle::Masked {
            bounds: Rect::new(100.0, 100.0, 300.0, 300.0),
            mask: Rc::new(mask),
        }];

        run(&mut state, &obstacles, Bounds::new(800.0, 600.0), 20);
        assert!(state.balls[0].pos.y > 180.0, "y = {}", state.balls[0].pos.y);
    }

    #[test]
    fn test_rotation_follows_horizontal_velocity() {
        let mut state = SimState::new(quiet_config(), 1);
        state.balls.push(Ball::new(1, Vec2::new(100.0, 100.0), Vec2::new(5.0, 0.0), 0.0));
        step(&mut state, &[], Bounds::new(800.0, 600.0), 0.0);
        assert!(state.balls[0].angle > 0.0);
    }

    #[test]
    fn test_impact_flag_set_and_expires() {
        let mut state = SimState::new(quiet_config(), 1);
        state.balls.push(Ball::new(1, Vec2::new(100.0, 585.0), Vec2::new(0.0, 10.0), 0.0));
        let bounds = Bounds::new(800.0, 600.0);

        run(&mut state, &[], bounds, 1);
        let config = state.config.clone();
        assert!(state.balls[0].visual(&config).impact);

        run(&mut state, &[], bounds, 12);
        assert!(!state.balls[0].visual(&config).impact);
    }

    fn obstacle_strategy() -> impl Strategy<Value = Obstacle> {
        (0.0f32..700.0, 0.0f32..500.0, 20.0f32..200.0, 20.0f32..200.0, any::<bool>()).prop_map(
            |(x, y, w, h, masked)| {
                let rect = Rect::from_xywh(x, y, w, h);
                if masked {
                    let alpha = (0..64).map(|i| if i % 3 == 0 { 0 } else { 255 }).collect();
                    let mask = AlphaMask::new(8, 8, alpha).unwrap();
                    Obstacle::Masked {
                        bounds: rect,
                        mask: Rc::new(mask),
                    }
                } else {
                    Obstacle::Rect(rect)
                }
            },
        )
    }

    proptest! {
        #[test]
        fn prop_speed_never_exceeds_max(
            seed in any::<u64>(),
            clicks in prop::collection::vec((10.0f32..790.0, 10.0f32..590.0), 1..25),
            obstacles in prop::collection::vec(obstacle_strategy(), 0..5),
            frame_ms in prop::collection::vec(1.0f64..60.0, 1..120),
            cursor in prop::option::of((0.0f32..800.0, 0.0f32..600.0)),
        ) {
            let mut state = SimState::new(PhysicsConfig::default(), seed);
            state.set_cursor(cursor.map(|(x, y)| Vec2::new(x, y)));
            for (x, y) in clicks {
                state.spawn_ball(Vec2::new(x, y));
            }
            prop_assert!(state.balls.len() <= state.config.ball_cap());

            let bounds = Bounds::new(800.0, 600.0);
            let mut now = 0.0;
            for ms in frame_ms {
                now += ms;
                step(&mut state, &obstacles, bounds, now);
                for ball in &state.balls {
                    prop_assert!(ball.speed() <= state.config.max_speed + 1e-3);
                }
            }
        }

        #[test]
        fn prop_overlapping_pairs_end_at_contact_distance(
            ax in 0.0f32..100.0, ay in 0.0f32..100.0,
            dx in -19.0f32..19.0, dy in -19.0f32..19.0,
            avx in -10.0f32..10.0, avy in -10.0f32..10.0,
            bvx in -10.0f32..10.0, bvy in -10.0f32..10.0,
        ) {
            let config = PhysicsConfig::default();
            prop_assume!(dx * dx + dy * dy < 19.0 * 19.0);
            prop_assume!(dx * dx + dy * dy > 1e-3);
            let mut a = Ball::new(1, Vec2::new(ax, ay), Vec2::new(avx, avy), 0.0);
            let mut b = Ball::new(2, Vec2::new(ax + dx, ay + dy), Vec2::new(bvx, bvy), 0.0);
            prop_assert!(ball_ball_collision(&mut a, &mut b, &config));
            let dist = (b.pos - a.pos).length();
            prop_assert!((dist - config.contact_distance()).abs() < 1e-3);
        }
    }
}
