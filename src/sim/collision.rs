//! Collision detection and response
//!
//! Balls against rectangles, alpha masks, each other and the page edges.
//! Every resolver mutates the ball(s) in place and reports whether it hit.

use glam::Vec2;

use super::obstacle::{AlphaMask, Obstacle, Rect};
use super::state::Ball;
use crate::config::PhysicsConfig;
use crate::consts::{MASK_NORMAL_STEP, MIN_BALL_DISTANCE};

/// Axis a rectangle hit was resolved along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitAxis {
    X,
    Y,
}

/// Reflect one velocity component off a straight edge
///
/// Flips the sign, scales by `bounce` and snaps to zero below `stop`.
#[inline]
pub fn bounce_component(v: f32, bounce: f32, stop: f32) -> f32 {
    let reflected = -v * bounce;
    if reflected.abs() < stop { 0.0 } else { reflected }
}

/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Resolve a ball against a rectangle
///
/// Resolves along the axis with the smaller penetration (X on ties), placing
/// the ball flush against the violated edge.
pub fn ball_rect_collision(ball: &mut Ball, rect: &Rect, config: &PhysicsConfig) -> Option<HitAxis> {
    let r = config.ball_radius;
    if !rect.overlaps_square(ball.pos, r) {
        return None;
    }

    let from_left = ball.pos.x + r - rect.left;
    let from_right = rect.right - (ball.pos.x - r);
    let from_top = ball.pos.y + r - rect.top;
    let from_bottom = rect.bottom - (ball.pos.y - r);

    let min_x = from_left.min(from_right);
    let min_y = from_top.min(from_bottom);

    if min_x <= min_y {
        ball.pos.x = if from_left < from_right {
            rect.left - r
        } else {
            rect.right + r
        };
        ball.vel.x = bounce_component(ball.vel.x, config.bounce, config.stop_threshold);
        Some(HitAxis::X)
    } else {
        ball.pos.y = if from_top < from_bottom {
            rect.top - r
        } else {
            rect.bottom + r
        };
        ball.vel.y = bounce_component(ball.vel.y, config.bounce, config.stop_threshold);
        Some(HitAxis::Y)
    }
}

/// Whether the mask is opaque at a point of the obstacle
pub fn mask_hit(mask: &AlphaMask, bounds: &Rect, point: Vec2, alpha_threshold: u8) -> bool {
    let (px, py) = mask.pixel_for(bounds, point);
    mask.alpha_at(px, py) > alpha_threshold
}

/// Surface normal from the opacity gradient around a pixel
///
/// Points from opaque toward transparent. Zero if opacity is flat.
pub fn mask_normal(mask: &AlphaMask, px: i32, py: i32) -> Vec2 {
    let s = MASK_NORMAL_STEP;
    let dx = mask.alpha_at(px + s, py) as f32 - mask.alpha_at(px - s, py) as f32;
    let dy = mask.alpha_at(px, py + s) as f32 - mask.alpha_at(px, py - s) as f32;
    (-Vec2::new(dx, dy)).normalize_or_zero()
}

/// Resolve a ball against an alpha-masked obstacle
///
/// On a hit the velocity is mirrored about the estimated normal, scaled by
/// `bounce`, and the ball is put back where it started the step.
pub fn ball_mask_collision(
    ball: &mut Ball,
    bounds: &Rect,
    mask: &AlphaMask,
    config: &PhysicsConfig,
) -> bool {
    if !bounds.overlaps_square(ball.pos, config.ball_radius) {
        return false;
    }

    if !mask_hit(mask, bounds, ball.pos, config.alpha_threshold) {
        return false;
    }
    // Started the step inside the opaque region (spawned there): rolling back
    // would pin it in place, so let it move out
    if bounds.contains(ball.prev_pos) && mask_hit(mask, bounds, ball.prev_pos, config.alpha_threshold) {
        return false;
    }

    let (px, py) = mask.pixel_for(bounds, ball.pos);

    let mut normal = mask_normal(mask, px, py);
    if normal == Vec2::ZERO {
        normal = -ball.vel.normalize_or_zero();
        if normal == Vec2::ZERO {
            normal = Vec2::NEG_Y;
        }
    }

    ball.vel = reflect_velocity(ball.vel, normal) * config.bounce;
    ball.pos = ball.prev_pos;
    true
}

/// Resolve a ball against any obstacle
pub fn ball_obstacle_collision(ball: &mut Ball, obstacle: &Obstacle, config: &PhysicsConfig) -> bool {
    match obstacle {
        Obstacle::Rect(rect) => ball_rect_collision(ball, rect, config).is_some(),
        Obstacle::Masked { bounds, mask } => ball_mask_collision(ball, bounds, mask, config),
    }
}

/// Resolve two overlapping balls
///
/// Separates them symmetrically to exactly the contact distance, then applies
/// a restitution impulse along the contact normal if they are approaching.
pub fn ball_ball_collision(a: &mut Ball, b: &mut Ball, config: &PhysicsConfig) -> bool {
    let contact = config.contact_distance();
    let delta = b.pos - a.pos;
    let dist_sq = delta.length_squared();
    if dist_sq >= contact * contact {
        return false;
    }

    let mut dist = dist_sq.sqrt();
    let normal = if dist < MIN_BALL_DISTANCE {
        dist = MIN_BALL_DISTANCE;
        Vec2::X
    } else {
        delta / dist
    };

    let half_overlap = (contact - dist) * 0.5;
    a.pos -= normal * half_overlap;
    b.pos += normal * half_overlap;

    // Equal masses: j = (1 + e) * v_rel_n / 2
    let rel_normal = (b.vel - a.vel).dot(normal);
    if rel_normal < 0.0 {
        let j = (1.0 + config.ball_restitution) * rel_normal * 0.5;
        a.vel += normal * j;
        b.vel -= normal * j;
    }
    true
}

/// Keep a ball inside the page edges
///
/// Returns true if any edge was hit. The floor is skipped with `open_floor`.
pub fn ball_bounds_collision(ball: &mut Ball, width: f32, height: f32, config: &PhysicsConfig) -> bool {
    let r = config.ball_radius;
    let bounce = config.bounce;
    let stop = config.stop_threshold;
    let mut hit = false;

    if ball.pos.x < r {
        ball.pos.x = r;
        ball.vel.x = bounce_component(ball.vel.x, bounce, stop);
        hit = true;
    } else if ball.pos.x > width - r {
        ball.pos.x = width - r;
        ball.vel.x = bounce_component(ball.vel.x, bounce, stop);
        hit = true;
    }

    if ball.pos.y < r {
        ball.pos.y = r;
        ball.vel.y = bounce_component(ball.vel.y, bounce, stop);
        hit = true;
    } else if !config.open_floor && ball.pos.y > height - r {
        ball.pos.y = height - r;
        ball.vel.y = bounce_component(ball.vel.y, bounce, stop);
        hit = true;
    }

    hit
}
