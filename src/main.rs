//! folio-fx entry point
//!
//! In the browser: wires the ball toy and page effects, then drives the
//! simulation with `requestAnimationFrame` while any ball is alive.
//! Natively: runs a short headless simulation and logs what happened.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, MouseEvent, Node};

    use folio_fx::PhysicsConfig;
    use folio_fx::platform::balls::BallRenderer;
    use folio_fx::platform::obstacles::DomObstacleSource;
    use folio_fx::platform::{document, page, sim_bounds, to_sim_space, window};
    use folio_fx::sim::{ObstacleCache, SimState, step};

    /// Clicks on these never spawn a ball
    const INTERACTIVE_SELECTOR: &str = "a, button, input, textarea, select, label, summary";
    const ZONE_SELECTOR: &str = "[data-physics-zone]";

    /// Everything the frame loop and input handlers share
    struct App {
        state: SimState,
        cache: ObstacleCache,
        source: DomObstacleSource,
        renderer: BallRenderer,
        /// A frame callback is queued
        frame_scheduled: bool,
    }

    impl App {
        fn new(config: PhysicsConfig, seed: u64) -> folio_fx::Result<Self> {
            let space = config.space;
            let ttl = config.obstacle_ttl_ms;
            Ok(Self {
                state: SimState::new(config, seed),
                cache: ObstacleCache::new(ttl),
                source: DomObstacleSource::new(space),
                renderer: BallRenderer::new()?,
                frame_scheduled: false,
            })
        }

        /// Spawn a ball at a client-space point
        fn spawn_at(&mut self, client_x: f32, client_y: f32) {
            let (x, y) = to_sim_space(self.state.config.space, client_x, client_y);
            let events = self.state.spawn_ball(Vec2::new(x, y));
            self.renderer.apply_events(&events, &self.state.config);
            self.renderer.sync(&self.state);
            log::debug!(
                "Spawned at ({:.0}, {:.0}); {} balls",
                x,
                y,
                self.state.balls.len()
            );
        }

        /// Advance one frame; true if another should be scheduled
        fn frame(&mut self, time: f64) -> bool {
            let App {
                state,
                cache,
                source,
                renderer,
                ..
            } = self;

            let bounds = sim_bounds(state.config.space);
            let obstacles = cache.get(time, source);
            let outcome = step(state, obstacles, bounds, time);

            renderer.apply_events(&outcome.events, &state.config);
            renderer.sync(state);

            if !outcome.keep_running {
                log::debug!("All balls gone; frame loop stopped");
            }
            outcome.keep_running
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("folio-fx starting...");

        // Page effects don't depend on the ball toy
        page::setup_all();

        let config = PhysicsConfig::load();
        let seed = js_sys::Date::now() as u64;
        let app = match App::new(config, seed) {
            Ok(app) => Rc::new(RefCell::new(app)),
            Err(e) => {
                log::error!("Ball toy disabled: {}", e);
                return;
            }
        };

        if let Err(e) = setup_input_handlers(app) {
            log::error!("Couldn't attach input handlers: {}", e);
            return;
        }

        log::info!("folio-fx running!");
    }

    /// Whether a click on `target` should spawn a ball
    fn click_qualifies(target: &Element) -> bool {
        if target.closest(INTERACTIVE_SELECTOR).ok().flatten().is_some() {
            return false;
        }
        match document().ok().and_then(|d| d.query_selector(ZONE_SELECTOR).ok().flatten()) {
            Some(zone) => {
                let node: &Node = target.as_ref();
                zone.contains(Some(node))
            }
            None => true,
        }
    }

    fn setup_input_handlers(app: Rc<RefCell<App>>) -> folio_fx::Result<()> {
        let document = document()?;

        // Click to spawn
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let qualifies = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .is_some_and(|el| click_qualifies(&el));
                if !qualifies {
                    return;
                }

                let start = {
                    let mut a = app.borrow_mut();
                    a.spawn_at(event.client_x() as f32, event.client_y() as f32);
                    let start = !a.frame_scheduled;
                    a.frame_scheduled = true;
                    start
                };
                if start {
                    request_animation_frame(app.clone());
                }
            });
            document.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Cursor tracking for the magnet
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                let space = a.state.config.space;
                let (x, y) = to_sim_space(space, event.client_x() as f32, event.client_y() as f32);
                a.state.set_cursor(Some(Vec2::new(x, y)));
            });
            document
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Layout changed: re-read obstacles on the next frame
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().cache.invalidate();
            });
            window()?.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Pointer left the page
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().state.set_cursor(None);
            });
            if let Some(root) = document.document_element() {
                root.add_event_listener_with_callback(
                    "mouseleave",
                    closure.as_ref().unchecked_ref(),
                )?;
            }
            closure.forget();
        }

        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Ok(window) = window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        if window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::warn!("requestAnimationFrame failed");
        }
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        let keep_running = {
            let mut a = app.borrow_mut();
            let keep_running = a.frame(time);
            a.frame_scheduled = keep_running;
            keep_running
        };

        if keep_running {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("folio-fx (native) starting...");
    log::info!("The page effects need a browser - build for wasm32 to use them");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drop a handful of balls onto a ledge and run until they are all gone
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use folio_fx::PhysicsConfig;
    use folio_fx::consts::NOMINAL_FRAME_MS;
    use folio_fx::sim::{Bounds, LaunchPattern, Obstacle, Rect, SimEvent, SimState, step};
    use glam::Vec2;

    const MAX_FRAMES: u32 = 60 * 60;

    let config = PhysicsConfig::load();
    let bounds = Bounds::new(1280.0, 720.0);
    let obstacles: Vec<Obstacle> = [
        Rect::from_xywh(200.0, 400.0, 500.0, 80.0),
        Rect::from_xywh(800.0, 250.0, 300.0, 200.0),
    ]
    .into_iter()
    .filter_map(Obstacle::from_layout)
    .collect();

    let mut state = SimState::new(config, 42);
    for (i, pattern) in LaunchPattern::ALL.iter().cycle().take(8).enumerate() {
        let pos = Vec2::new(250.0 + i as f32 * 110.0, 100.0);
        state.spawn_ball_with(pos, *pattern);
    }
    log::info!(
        "Spawned {} balls against {} obstacles",
        state.balls.len(),
        obstacles.len()
    );

    let mut now = 0.0;
    let mut faded = 0;
    let mut removed = 0;
    for frame in 0..MAX_FRAMES {
        now += NOMINAL_FRAME_MS;
        let outcome = step(&mut state, &obstacles, bounds, now);
        for event in &outcome.events {
            match event {
                SimEvent::Faded(_) => faded += 1,
                SimEvent::Removed(_) => removed += 1,
                SimEvent::Spawned(_) => {}
            }
        }
        if frame % 60 == 0 {
            let resting = state
                .balls
                .iter()
                .filter(|b| b.visual(&state.config).resting)
                .count();
            log::info!(
                "t={:>5.1}s balls={} resting={}",
                now / 1000.0,
                state.balls.len(),
                resting
            );
        }
        if !outcome.keep_running {
            log::info!(
                "Simulation settled after {} frames ({} faded, {} removed)",
                frame + 1,
                faded,
                removed
            );
            return;
        }
    }
    log::warn!(
        "Still {} balls after {} frames",
        state.balls.len(),
        MAX_FRAMES
    );
}
