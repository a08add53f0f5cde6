//! Browser platform layer
//!
//! Thin adapters between the pure modules and the DOM:
//! - `obstacles`: layout scan and mask rasterization
//! - `balls`: one element per simulated ball
//! - `page`: reveal observer, scroll scenes, anchors, clipboard, contact form
//!
//! Everything here is WASM only; the rest of the crate builds and tests natively.

#[cfg(target_arch = "wasm32")]
pub mod balls;
#[cfg(target_arch = "wasm32")]
pub mod obstacles;
#[cfg(target_arch = "wasm32")]
pub mod page;

#[cfg(target_arch = "wasm32")]
pub use web::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{Document, Window};

    use crate::config::CoordinateSpace;
    use crate::error::{FxError, Result};
    use crate::sim::Bounds;

    pub fn window() -> Result<Window> {
        web_sys::window().ok_or(FxError::Missing("window"))
    }

    pub fn document() -> Result<Document> {
        window()?.document().ok_or(FxError::Missing("document"))
    }

    /// `prefers-reduced-motion: reduce`
    pub fn prefers_reduced_motion() -> bool {
        window()
            .ok()
            .and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok().flatten())
            .map(|mql| mql.matches())
            .unwrap_or(false)
    }

    /// Current scroll offset (x, y)
    pub fn scroll_offset() -> (f32, f32) {
        match window() {
            Ok(w) => (
                w.scroll_x().unwrap_or(0.0) as f32,
                w.scroll_y().unwrap_or(0.0) as f32,
            ),
            Err(_) => (0.0, 0.0),
        }
    }

    /// Viewport size in CSS pixels (excluding scrollbars)
    pub fn viewport_size() -> (f32, f32) {
        let root = document().ok().and_then(|d| d.document_element());
        match root {
            Some(el) => (el.client_width() as f32, el.client_height() as f32),
            None => (0.0, 0.0),
        }
    }

    /// Simulation extent for a coordinate space
    pub fn sim_bounds(space: CoordinateSpace) -> Bounds {
        let (vw, vh) = viewport_size();
        match space {
            CoordinateSpace::Viewport => Bounds::new(vw, vh),
            CoordinateSpace::Document => {
                let height = document()
                    .ok()
                    .and_then(|d| d.document_element())
                    .map(|el| el.scroll_height() as f32)
                    .unwrap_or(vh);
                Bounds::new(vw, height.max(vh))
            }
        }
    }

    /// Convert a client-space point into the simulation's space
    pub fn to_sim_space(space: CoordinateSpace, x: f32, y: f32) -> (f32, f32) {
        let (sx, sy) = scroll_offset();
        space.from_client(x, y, sx, sy)
    }
}
