//! Ball spawning on pointer clicks

use glam::Vec2;
use rand::Rng;

use super::state::{Ball, SimEvent, SimState};

/// How a freshly spawned ball is thrown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchPattern {
    /// Random direction at the configured launch speed
    RadialBurst,
    /// Mostly straight down with a little sideways drift
    Drop,
    /// Thrown upward with a wide horizontal spread
    UpwardArc,
    /// Fully random direction and speed
    Scatter,
}

impl LaunchPattern {
    pub const ALL: [LaunchPattern; 4] = [
        LaunchPattern::RadialBurst,
        LaunchPattern::Drop,
        LaunchPattern::UpwardArc,
        LaunchPattern::Scatter,
    ];

    /// Pick a pattern uniformly at random
    pub fn choose(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Initial velocity for this pattern (before jitter)
    pub fn velocity(&self, rng: &mut impl Rng, launch_speed: f32) -> Vec2 {
        match self {
            LaunchPattern::RadialBurst => {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                Vec2::new(angle.cos(), angle.sin()) * launch_speed
            }
            LaunchPattern::Drop => Vec2::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(2.0..4.0),
            ),
            LaunchPattern::UpwardArc => Vec2::new(
                rng.random_range(-6.0..6.0),
                -rng.random_range(10.0f32..14.0),
            ),
            LaunchPattern::Scatter => Vec2::new(
                rng.random_range(-launch_speed..launch_speed),
                rng.random_range(-launch_speed..launch_speed),
            ),
        }
    }
}

/// Largest spin given to a new ball (radians per nominal frame)
const MAX_SPIN: f32 = 0.05;

impl SimState {
    /// Spawn a ball at `pos` with a random launch pattern
    ///
    /// Evicts the oldest tracked ball first when at the cap. Returns the
    /// events the renderer needs (evictions, then the spawn).
    pub fn spawn_ball(&mut self, pos: Vec2) -> Vec<SimEvent> {
        let pattern = LaunchPattern::choose(&mut self.rng);
        self.spawn_ball_with(pos, pattern)
    }

    /// Spawn with an explicit launch pattern
    pub fn spawn_ball_with(&mut self, pos: Vec2, pattern: LaunchPattern) -> Vec<SimEvent> {
        let mut events = Vec::new();

        let cap = self.config.ball_cap();
        while self.balls.len() >= cap {
            let evicted = self.balls.remove(0);
            log::debug!("Ball cap reached, evicting ball {}", evicted.id);
            events.push(SimEvent::Removed(evicted.id));
        }

        let jitter = self.config.launch_jitter;
        let mut vel = pattern.velocity(&mut self.rng, self.config.launch_speed);
        if jitter > 0.0 {
            vel += Vec2::new(
                self.rng.random_range(-jitter..jitter),
                self.rng.random_range(-jitter..jitter),
            );
        }
        let spin = self.rng.random_range(-MAX_SPIN..MAX_SPIN);

        let id = self.next_entity_id();
        self.balls.push(Ball::new(id, pos, vel, spin));
        events.push(SimEvent::Spawned(id));

        if !self.running {
            // Fresh loop: first step uses a nominal frame
            self.running = true;
            self.last_frame_ms = None;
        }

        log::debug!("Spawned ball {} ({:?}) at ({:.0}, {:.0})", id, pattern, pos.x, pos.y);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;

    #[test]
    fn test_spawn_starts_loop() {
        let mut state = SimState::new(PhysicsConfig::default(), 7);
        assert!(!state.running);
        let events = state.spawn_ball(Vec2::new(100.0, 100.0));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SimEvent::Spawned(_)));
        assert!(state.running);
        assert_eq!(state.balls[0].pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_spawn_at_cap_evicts_oldest() {
        let config = PhysicsConfig {
            max_balls: Some(20),
            ..PhysicsConfig::default()
        };
        let mut state = SimState::new(config, 7);
        for i in 0..20 {
            state.spawn_ball(Vec2::new(i as f32 * 10.0, 50.0));
        }
        let oldest = state.balls[0].id;
        let second = state.balls[1].id;

        let events = state.spawn_ball(Vec2::new(300.0, 300.0));
        assert_eq!(events[0], SimEvent::Removed(oldest));
        assert!(matches!(events[1], SimEvent::Spawned(_)));
        assert_eq!(events.len(), 2);
        assert_eq!(state.balls.len(), 20);
        assert_eq!(state.balls[0].id, second);
        assert!(state.balls.iter().all(|b| b.id != oldest));
    }

    #[test]
    fn test_zero_cap_keeps_only_newest_ball() {
        let config = PhysicsConfig {
            max_balls: Some(0),
            ..PhysicsConfig::default()
        };
        let mut state = SimState::new(config, 7);
        let first = state.spawn_ball(Vec2::new(10.0, 10.0));
        assert_eq!(first.len(), 1);

        let events = state.spawn_ball(Vec2::new(20.0, 20.0));
        assert!(matches!(events[0], SimEvent::Removed(_)));
        assert_eq!(state.balls.len(), 1);
        assert_eq!(state.balls[0].pos, Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_patterns_point_the_right_way() {
        let mut state = SimState::new(PhysicsConfig::default(), 42);
        for _ in 0..50 {
            let drop = LaunchPattern::Drop.velocity(&mut state.rng, 12.0);
            assert!(drop.y > 0.0 && drop.x.abs() <= 1.0);

            let arc = LaunchPattern::UpwardArc.velocity(&mut state.rng, 12.0);
            assert!(arc.y < 0.0);

            let burst = LaunchPattern::RadialBurst.velocity(&mut state.rng, 12.0);
            assert!((burst.length() - 12.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_same_seed_same_launch() {
        let mut a = SimState::new(PhysicsConfig::default(), 99);
        let mut b = SimState::new(PhysicsConfig::default(), 99);
        a.spawn_ball(Vec2::new(10.0, 10.0));
        b.spawn_ball(Vec2::new(10.0, 10.0));
        assert_eq!(a.balls[0].vel, b.balls[0].vel);
    }

    #[test]
    fn test_every_pattern_gets_chosen() {
        let mut state = SimState::new(PhysicsConfig::default(), 3);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let pattern = LaunchPattern::choose(&mut state.rng);
            let idx = LaunchPattern::ALL.iter().position(|p| *p == pattern).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
