//! Obstacle geometry
//!
//! Obstacles come from page layout: plain rectangles inset from an element's
//! box, or image-backed shapes carrying a per-pixel alpha mask. Querying the
//! page is expensive, so [`ObstacleCache`] only re-reads it after a short TTL.

use std::rc::Rc;

use glam::Vec2;

use crate::consts::*;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Whether a ball's bounding square overlaps this rectangle
    #[inline]
    pub fn overlaps_square(&self, center: Vec2, half: f32) -> bool {
        center.x + half > self.left
            && center.x - half < self.right
            && center.y + half > self.top
            && center.y - half < self.bottom
    }

    /// Whether a point lies inside (edges inclusive)
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        (self.left..=self.right).contains(&point.x) && (self.top..=self.bottom).contains(&point.y)
    }

    /// Shrink by the layout inset; None if what remains is degenerate
    pub fn inset_for_collision(&self) -> Option<Rect> {
        let dx = OBSTACLE_INSET_X_PX.min(self.width() * OBSTACLE_INSET_X_FRACTION);
        let dy = OBSTACLE_INSET_Y_PX.min(self.height() * OBSTACLE_INSET_Y_FRACTION);
        Rect::new(
            self.left + dx,
            self.top + dy,
            self.right - dx,
            self.bottom - dy,
        )
        .non_degenerate()
    }

    /// None if smaller than the minimum collidable size
    pub fn non_degenerate(self) -> Option<Rect> {
        (self.width() >= OBSTACLE_MIN_WIDTH && self.height() >= OBSTACLE_MIN_HEIGHT)
            .then_some(self)
    }
}

/// Per-pixel opacity sampled from an image, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    alpha: Vec<u8>,
}

impl AlphaMask {
    /// Build from one alpha byte per pixel; None on size mismatch or empty mask
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || alpha.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            alpha,
        })
    }

    /// Build from RGBA pixel data (canvas `getImageData` layout)
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        let alpha = rgba.chunks_exact(4).map(|px| px[3]).collect();
        Self::new(width, height, alpha)
    }

    /// Alpha at a pixel; outside the mask counts as transparent
    #[inline]
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.alpha[y as usize * self.width as usize + x as usize]
    }

    /// Map a point inside `bounds` to mask pixel coordinates
    pub fn pixel_for(&self, bounds: &Rect, point: Vec2) -> (i32, i32) {
        let u = (point.x - bounds.left) / bounds.width();
        let v = (point.y - bounds.top) / bounds.height();
        let x = (u * self.width as f32).floor() as i32;
        let y = (v * self.height as f32).floor() as i32;
        (
            x.clamp(0, self.width as i32 - 1),
            y.clamp(0, self.height as i32 - 1),
        )
    }
}

/// A collidable shape for one frame
#[derive(Debug, Clone, PartialEq)]
pub enum Obstacle {
    Rect(Rect),
    Masked { bounds: Rect, mask: Rc<AlphaMask> },
}

impl Obstacle {
    /// Rectangular obstacle from an element's layout box (inset applied)
    pub fn from_layout(layout: Rect) -> Option<Self> {
        layout.inset_for_collision().map(Obstacle::Rect)
    }

    /// Mask obstacle covering an image's full layout box
    pub fn masked(layout: Rect, mask: Rc<AlphaMask>) -> Option<Self> {
        layout
            .non_degenerate()
            .map(|bounds| Obstacle::Masked { bounds, mask })
    }
}

/// Something that can enumerate the current obstacles (the page, in a browser)
pub trait ObstacleSource {
    fn collect(&mut self) -> Vec<Obstacle>;
}

impl<F> ObstacleSource for F
where
    F: FnMut() -> Vec<Obstacle>,
{
    fn collect(&mut self) -> Vec<Obstacle> {
        self()
    }
}

/// Obstacle list refreshed at most once per TTL
#[derive(Debug, Clone)]
pub struct ObstacleCache {
    obstacles: Vec<Obstacle>,
    fetched_at_ms: Option<f64>,
    ttl_ms: f64,
}

impl ObstacleCache {
    pub fn new(ttl_ms: f64) -> Self {
        Self {
            obstacles: Vec::new(),
            fetched_at_ms: None,
            ttl_ms,
        }
    }

    /// Current obstacles, re-querying `source` if the cache has expired
    pub fn get(&mut self, now_ms: f64, source: &mut impl ObstacleSource) -> &[Obstacle] {
        let stale = match self.fetched_at_ms {
            Some(at) => now_ms - at >= self.ttl_ms || now_ms < at,
            None => true,
        };
        if stale {
            self.obstacles = source.collect();
            self.fetched_at_ms = Some(now_ms);
            log::trace!("Obstacle cache refreshed: {} obstacles", self.obstacles.len());
        }
        &self.obstacles
    }

    /// Force the next `get` to re-query
    pub fn invalidate(&mut self) {
        self.fetched_at_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inset_uses_smaller_of_px_and_fraction() {
        // Large box: fixed 10px inset on each side
        let rect = Rect::from_xywh(0.0, 0.0, 400.0, 200.0)
            .inset_for_collision()
            .unwrap();
        assert_eq!(rect, Rect::new(10.0, 10.0, 390.0, 190.0));

        // Small box: percentage inset (8% of 50 = 4, 12% of 50 = 6)
        let rect = Rect::from_xywh(0.0, 0.0, 50.0, 50.0)
            .inset_for_collision()
            .unwrap();
        assert!((rect.left - 4.0).abs() < 1e-4);
        assert!((rect.top - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_obstacles_are_dropped() {
        // 6px wide before inset shrinks below the 6px floor
        assert!(Obstacle::from_layout(Rect::from_xywh(0.0, 0.0, 6.0, 100.0)).is_none());
        assert!(Obstacle::from_layout(Rect::from_xywh(0.0, 0.0, 100.0, 4.0)).is_none());
        assert!(Obstacle::from_layout(Rect::from_xywh(0.0, 0.0, 100.0, 40.0)).is_some());
    }

    #[test]
    fn test_mask_from_rgba_keeps_alpha_channel() {
        let rgba = [1, 2, 3, 10, 4, 5, 6, 200];
        let mask = AlphaMask::from_rgba(2, 1, &rgba).unwrap();
        assert_eq!(mask.alpha_at(0, 0), 10);
        assert_eq!(mask.alpha_at(1, 0), 200);
        assert_eq!(mask.alpha_at(2, 0), 0);
        assert_eq!(mask.alpha_at(-1, 0), 0);
    }

    #[test]
    fn test_mask_rejects_bad_sizes() {
        assert!(AlphaMask::new(0, 4, Vec::new()).is_none());
        assert!(AlphaMask::new(2, 2, vec![0; 3]).is_none());
    }

    #[test]
    fn test_mask_pixel_mapping_scales_to_mask_size() {
        let mask = AlphaMask::new(10, 10, vec![0; 100]).unwrap();
        let bounds = Rect::from_xywh(100.0, 100.0, 200.0, 200.0);
        assert_eq!(mask.pixel_for(&bounds, Vec2::new(100.0, 100.0)), (0, 0));
        assert_eq!(mask.pixel_for(&bounds, Vec2::new(200.0, 150.0)), (5, 2));
        assert_eq!(mask.pixel_for(&bounds, Vec2::new(300.0, 300.0)), (9, 9));
    }

    #[test]
    fn test_cache_requeries_only_after_ttl() {
        let mut calls = 0;
        let mut source = || {
            calls += 1;
            vec![Obstacle::Rect(Rect::from_xywh(0.0, 0.0, 50.0, 50.0))]
        };
        let mut cache = ObstacleCache::new(100.0);

        assert_eq!(cache.get(0.0, &mut source).len(), 1);
        cache.get(50.0, &mut source);
        cache.get(99.0, &mut source);
        cache.get(100.0, &mut source);
        cache.invalidate();
        cache.get(101.0, &mut source);
        drop(source);
        assert_eq!(calls, 3);
    }
}
