//! Ball elements
//!
//! One `div.physics-ball` per simulated ball, created on spawn and removed
//! with the ball. Each frame writes position, rotation and state classes.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use super::document;
use crate::config::PhysicsConfig;
use crate::error::{FxError, Result};
use crate::sim::{BallVisual, SimEvent, SimState};

const BALL_CLASS: &str = "physics-ball";

/// Owns the ball elements, keyed by ball id
pub struct BallRenderer {
    document: Document,
    container: HtmlElement,
    elements: HashMap<u32, HtmlElement>,
}

impl BallRenderer {
    pub fn new() -> Result<Self> {
        let document = document()?;
        let container = document.body().ok_or(FxError::Missing("body"))?;
        Ok(Self {
            document,
            container,
            elements: HashMap::new(),
        })
    }

    /// Create or drop elements for simulation events
    pub fn apply_events(&mut self, events: &[SimEvent], config: &PhysicsConfig) {
        for event in events {
            match *event {
                SimEvent::Spawned(id) => match self.create(config) {
                    Ok(el) => {
                        self.elements.insert(id, el);
                    }
                    Err(e) => log::warn!("Couldn't create ball element: {}", e),
                },
                SimEvent::Faded(id) => {
                    if let Some(el) = self.elements.get(&id) {
                        let _ = el.class_list().add_1("is-fading");
                    }
                }
                SimEvent::Removed(id) => {
                    if let Some(el) = self.elements.remove(&id) {
                        el.remove();
                    }
                }
            }
        }
    }

    fn create(&self, config: &PhysicsConfig) -> Result<HtmlElement> {
        let el: HtmlElement = self
            .document
            .create_element("div")?
            .dyn_into()
            .map_err(|_| FxError::Missing("div element"))?;
        el.set_class_name(BALL_CLASS);
        let _ = el.set_attribute("aria-hidden", "true");

        let size = format!("{}px", config.ball_radius * 2.0);
        let style = el.style();
        style.set_property("position", config.space.css_position())?;
        style.set_property("width", &size)?;
        style.set_property("height", &size)?;
        style.set_property("pointer-events", "none")?;
        style.set_property("will-change", "transform")?;

        self.container.append_child(&el)?;
        Ok(el)
    }

    /// Write every ball's current state to its element
    pub fn sync(&self, state: &SimState) {
        for ball in &state.balls {
            if let Some(el) = self.elements.get(&ball.id) {
                let visual = ball.visual(&state.config);
                if let Err(e) = write_visual(el, &visual, state.config.ball_radius) {
                    log::debug!("Ball {} style update failed: {}", ball.id, e);
                }
            }
        }
    }
}

fn write_visual(el: &HtmlElement, visual: &BallVisual, radius: f32) -> Result<()> {
    let style = el.style();
    style.set_property("left", &format!("{:.2}px", visual.pos.x - radius))?;
    style.set_property("top", &format!("{:.2}px", visual.pos.y - radius))?;
    // Squash along the travel axis, then spin by whatever rotation remains
    style.set_property(
        "transform",
        &format!(
            "rotate({:.1}deg) scale({:.3}, {:.3}) rotate({:.1}deg)",
            visual.travel_deg,
            visual.stretch,
            2.0 - visual.stretch,
            visual.rotation_deg - visual.travel_deg
        ),
    )?;
    style.set_property("opacity", &format!("{:.3}", visual.opacity))?;

    let classes = el.class_list();
    classes.toggle_with_force("is-fast", visual.fast)?;
    classes.toggle_with_force("is-resting", visual.resting)?;
    classes.toggle_with_force("is-impact", visual.impact)?;
    classes.toggle_with_force("is-fading", visual.fading)?;
    Ok(())
}
