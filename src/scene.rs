//! Scroll-driven scene animations
//!
//! A scene is a page section whose styling follows how far it has scrolled
//! through the viewport. Tracks are declared as JSON in `data-scene-keys`:
//!
//! ```json
//! { "opacity": { "keys": [[0.0, 0.0], [0.3, 1.0]] },
//!   "--lift": { "unit": "px", "ease": "smooth", "keys": [[0.0, 60.0], [1.0, 0.0]] } }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;
use crate::lerp;

/// Progress of a section through the viewport
///
/// 0.0 while its top is still below the viewport, 1.0 once its bottom has
/// left through the top.
pub fn scroll_progress(rect_top: f32, rect_height: f32, viewport_height: f32) -> f32 {
    let travel = rect_height + viewport_height;
    if travel <= 0.0 {
        return 0.0;
    }
    ((viewport_height - rect_top) / travel).clamp(0.0, 1.0)
}

/// Interpolation curve between keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Easing {
    #[default]
    Linear,
    /// Smoothstep
    Smooth,
}

impl Easing {
    #[inline]
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// One animated property
#[derive(Debug, Clone, Deserialize)]
pub struct SceneTrack {
    /// Unit appended to the value (`px`, `deg`, `%`...)
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub ease: Easing,
    /// `(progress, value)` pairs
    keys: Vec<(f32, f32)>,
}

impl SceneTrack {
    fn sort_keys(&mut self) {
        self.keys.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    /// Value at `progress`, holding the end values outside the keyed range
    pub fn sample(&self, progress: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };
        if progress <= first.0 {
            return first.1;
        }
        if progress >= last.0 {
            return last.1;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if progress <= b.0 {
                let span = b.0 - a.0;
                let t = if span > 0.0 { (progress - a.0) / span } else { 1.0 };
                return lerp(a.1, b.1, self.ease.apply(t));
            }
        }
        last.1
    }

    /// CSS value at `progress`
    pub fn css_value(&self, progress: f32) -> String {
        format!("{:.3}{}", self.sample(progress), self.unit)
    }
}

/// All animated tracks of one scene element
#[derive(Debug, Clone, Default)]
pub struct Scene {
    tracks: BTreeMap<String, SceneTrack>,
}

impl Scene {
    /// Parse a `data-scene-keys` attribute
    pub fn from_json(json: &str) -> Result<Self> {
        let mut tracks: BTreeMap<String, SceneTrack> = serde_json::from_str(json)?;
        for track in tracks.values_mut() {
            track.sort_keys();
        }
        Ok(Self { tracks })
    }

    /// `(property, value)` pairs to apply at `progress`
    pub fn styles(&self, progress: f32) -> Vec<(&str, String)> {
        self.tracks
            .iter()
            .map(|(property, track)| (property.as_str(), track.css_value(progress)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(keys: Vec<(f32, f32)>) -> SceneTrack {
        let mut track = SceneTrack {
            unit: String::new(),
            ease: Easing::Linear,
            keys,
        };
        track.sort_keys();
        track
    }

    #[test]
    fn test_scroll_progress_edges() {
        // Below the fold
        assert_eq!(scroll_progress(900.0, 400.0, 800.0), 0.0);
        // Top just entering
        assert_eq!(scroll_progress(800.0, 400.0, 800.0), 0.0);
        // Halfway through its travel
        assert!((scroll_progress(200.0, 400.0, 800.0) - 0.5).abs() < 1e-6);
        // Scrolled past
        assert_eq!(scroll_progress(-500.0, 400.0, 800.0), 1.0);
        assert_eq!(scroll_progress(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_track_interpolates_and_holds_ends() {
        let track = linear(vec![(0.5, 100.0), (0.0, 0.0), (1.0, 50.0)]);
        assert_eq!(track.sample(-1.0), 0.0);
        assert!((track.sample(0.25) - 50.0).abs() < 1e-4);
        assert!((track.sample(0.75) - 75.0).abs() < 1e-4);
        assert_eq!(track.sample(2.0), 50.0);
    }

    #[test]
    fn test_smooth_easing_midpoint() {
        assert_eq!(Easing::Smooth.apply(0.5), 0.5);
        assert!(Easing::Smooth.apply(0.25) < 0.25);
    }

    #[test]
    fn test_scene_from_json() {
        let scene = Scene::from_json(
            r#"{"opacity":{"keys":[[0,0],[0.5,1]]},"--lift":{"unit":"px","ease":"smooth","keys":[[0,60],[1,0]]}}"#,
        )
        .unwrap();
        let styles = scene.styles(0.5);
        assert_eq!(styles, vec![("--lift", "30.000px".to_string()), ("opacity", "1.000".to_string())]);
    }

    #[test]
    fn test_scene_rejects_garbage() {
        assert!(Scene::from_json("[1,2,3]").is_err());
    }

    #[test]
    fn test_empty_track_is_zero() {
        assert_eq!(linear(Vec::new()).sample(0.5), 0.0);
        assert!(Scene::default().styles(0.5).is_empty());
    }
}
