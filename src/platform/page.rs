//! Page glue: reveal observer, scroll scenes, anchor links, copy buttons and
//! the contact form.
//!
//! Each `setup_*` function wires one behavior and returns early with an
//! error only when the page itself is unusable; missing optional elements
//! just mean there is nothing to wire.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Element, Event, FormData, Headers, HtmlButtonElement, HtmlElement, HtmlFormElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, MouseEvent,
    Request, RequestInit, Response, ScrollBehavior, ScrollToOptions,
};

use super::obstacles::query_all;
use super::{document, prefers_reduced_motion, viewport_size, window};
use crate::anchor::{AnchorTarget, ScrollMode, parse_fragment, scroll_target};
use crate::consts::{COPY_FEEDBACK_MS, SUBMIT_FEEDBACK_MS};
use crate::contact::{ContactSubmission, SubmitState, failure_message, invalid_message};
use crate::error::{FxError, Result};
use crate::reveal::{RevealMode, RevealPlan};
use crate::scene::{Scene, scroll_progress};

const REVEAL_SELECTOR: &str = "[data-reveal]";
const REVEAL_GROUP_SELECTOR: &str = "[data-reveal-group]";
const REVEAL_INDEX_ATTR: &str = "data-reveal-index";
const SCENE_SELECTOR: &str = "[data-scene]";
const ANCHOR_SELECTOR: &str = "a[href^=\"#\"]";
const HEADER_SELECTOR: &str = "[data-sticky-header]";
const COPY_SELECTOR: &str = "[data-copy-email]";
const CONTACT_SELECTOR: &str = "form[data-contact]";

/// Wire every page behavior, logging the ones that fail
pub fn setup_all() {
    let reduced_motion = prefers_reduced_motion();
    if reduced_motion {
        log::info!("Reduced motion requested; effects shown in final state");
    }

    let steps: [(&str, Result<()>); 5] = [
        ("reveal", setup_reveal(reduced_motion)),
        ("scenes", setup_scenes(reduced_motion)),
        ("anchors", setup_anchors(reduced_motion)),
        ("copy buttons", setup_copy_buttons()),
        ("contact form", setup_contact_form()),
    ];
    for (name, result) in steps {
        if let Err(e) = result {
            log::warn!("Couldn't set up {}: {}", name, e);
        }
    }
}

fn as_html(el: &Element) -> Option<&HtmlElement> {
    el.dyn_ref::<HtmlElement>()
}

// ---------------------------------------------------------------------------
// Reveal

fn setup_reveal(reduced_motion: bool) -> Result<()> {
    let document = document()?;
    let elements = query_all(&document, REVEAL_SELECTOR)?;
    if elements.is_empty() {
        return Ok(());
    }

    let positions: Vec<Option<usize>> = elements.iter().map(group_position).collect();
    let plan = RevealPlan::new(RevealMode::from_reduced_motion(reduced_motion), &positions);

    let transition = plan.mode().transition_override();
    for (i, (el, item)) in elements.iter().zip(plan.items()).enumerate() {
        el.set_attribute(REVEAL_INDEX_ATTR, &i.to_string())?;
        if let Some(html) = as_html(el) {
            let style = html.style();
            style.set_property("--reveal-delay", &format!("{}ms", item.delay_ms))?;
            if let Some(transition) = transition {
                style.set_property("transition", transition)?;
            }
        }
        if item.revealed {
            el.class_list().add_1("revealed")?;
        }
    }

    if !plan.needs_observer() {
        log::debug!("Revealed {} elements immediately", elements.len());
        return Ok(());
    }

    let plan = Rc::new(RefCell::new(plan));
    let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
        move |entries: js_sys::Array, observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if !entry.is_intersecting() {
                    continue;
                }
                let target = entry.target();
                let index = target
                    .get_attribute(REVEAL_INDEX_ATTR)
                    .and_then(|v| v.parse::<usize>().ok());
                if let Some(index) = index {
                    if plan.borrow_mut().on_intersect(index) {
                        let _ = target.class_list().add_1("revealed");
                        observer.unobserve(&target);
                    }
                }
            }
        },
    );

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(0.15));
    options.set_root_margin("0px 0px -40px 0px");
    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;
    callback.forget();

    for el in &elements {
        observer.observe(el);
    }
    log::debug!("Observing {} reveal elements", elements.len());
    Ok(())
}

/// Position of an element among its reveal group's children
fn group_position(el: &Element) -> Option<usize> {
    let parent = el.parent_element()?;
    if !parent.matches(REVEAL_GROUP_SELECTOR).unwrap_or(false) {
        return None;
    }
    let children = parent.children();
    (0..children.length()).position(|i| children.item(i).as_ref() == Some(el))
}

// ---------------------------------------------------------------------------
// Scroll scenes

struct SceneElement {
    el: HtmlElement,
    scene: Scene,
}

fn setup_scenes(reduced_motion: bool) -> Result<()> {
    let document = document()?;
    let mut scenes = Vec::new();
    for el in query_all(&document, SCENE_SELECTOR)? {
        let scene = match el.get_attribute("data-scene-keys") {
            Some(json) => Scene::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring bad data-scene-keys: {}", e);
                Scene::default()
            }),
            None => Scene::default(),
        };
        if let Ok(el) = el.dyn_into::<HtmlElement>() {
            scenes.push(SceneElement { el, scene });
        }
    }
    if scenes.is_empty() {
        return Ok(());
    }

    let scenes = Rc::new(scenes);
    if reduced_motion {
        // Final state, no scroll tracking
        apply_scenes(&scenes, Some(1.0));
        return Ok(());
    }
    apply_scenes(&scenes, None);

    let window = window()?;
    let frame_pending = Rc::new(Cell::new(false));
    let on_frame = {
        let scenes = scenes.clone();
        let frame_pending = frame_pending.clone();
        Closure::<dyn FnMut(f64)>::new(move |_time: f64| {
            frame_pending.set(false);
            apply_scenes(&scenes, None);
        })
    };
    let on_scroll = {
        let window = window.clone();
        Closure::<dyn FnMut(_)>::new(move |_event: Event| {
            // One update per frame however many scroll events arrive
            if frame_pending.replace(true) {
                return;
            }
            if window
                .request_animation_frame(on_frame.as_ref().unchecked_ref())
                .is_err()
            {
                frame_pending.set(false);
            }
        })
    };
    window.add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())?;
    window.add_event_listener_with_callback("resize", on_scroll.as_ref().unchecked_ref())?;
    on_scroll.forget();
    log::debug!("Tracking {} scroll scenes", scenes.len());
    Ok(())
}

/// Write progress and keyframed styles; `fixed` overrides the measured progress
fn apply_scenes(scenes: &[SceneElement], fixed: Option<f32>) {
    let (_, viewport_height) = viewport_size();
    for SceneElement { el, scene } in scenes {
        let progress = fixed.unwrap_or_else(|| {
            let rect = el.get_bounding_client_rect();
            scroll_progress(rect.top() as f32, rect.height() as f32, viewport_height)
        });
        let style = el.style();
        let _ = style.set_property("--scene-progress", &format!("{:.4}", progress));
        for (property, value) in scene.styles(progress) {
            let _ = style.set_property(property, &value);
        }
    }
}

// ---------------------------------------------------------------------------
// Anchors

fn setup_anchors(reduced_motion: bool) -> Result<()> {
    let document = document()?;
    let mode = ScrollMode::from_reduced_motion(reduced_motion);
    let links = query_all(&document, ANCHOR_SELECTOR)?;
    for link in &links {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let Some(link) = event
                .current_target()
                .and_then(|t| t.dyn_into::<Element>().ok())
            else {
                return;
            };
            let Some(target) = link.get_attribute("href").and_then(|h| parse_fragment(&h)) else {
                return;
            };
            match scroll_to_anchor(&target, mode) {
                Ok(true) => event.prevent_default(),
                Ok(false) => {}
                Err(e) => log::warn!("Anchor scroll failed: {}", e),
            }
        });
        link.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    log::debug!("Wired {} anchor links", links.len());
    Ok(())
}

/// Scroll to an anchor; false when the target doesn't exist on this page
fn scroll_to_anchor(target: &AnchorTarget, mode: ScrollMode) -> Result<bool> {
    let window = window()?;
    let document = document()?;
    let root = document
        .document_element()
        .ok_or(FxError::Missing("document element"))?;

    let top = match target {
        AnchorTarget::Top => 0.0,
        AnchorTarget::Element(id) => {
            let Some(el) = document.get_element_by_id(id) else {
                return Ok(false);
            };
            let header_height = document
                .query_selector(HEADER_SELECTOR)?
                .map(|h| h.get_bounding_client_rect().height())
                .unwrap_or(0.0);
            let max_scroll = (root.scroll_height() - root.client_height()) as f64;
            scroll_target(
                el.get_bounding_client_rect().top(),
                window.scroll_y()?,
                header_height,
                max_scroll,
            )
        }
    };

    let options = ScrollToOptions::new();
    options.set_top(top);
    options.set_behavior(match mode {
        ScrollMode::Smooth => ScrollBehavior::Smooth,
        ScrollMode::Instant => ScrollBehavior::Instant,
    });
    window.scroll_to_with_scroll_to_options(&options);
    Ok(true)
}

// ---------------------------------------------------------------------------
// Copy buttons

fn setup_copy_buttons() -> Result<()> {
    let document = document()?;
    for button in query_all(&document, COPY_SELECTOR)? {
        let Ok(button) = button.dyn_into::<HtmlElement>() else {
            continue;
        };
        let closure = {
            let button = button.clone();
            Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                let Some(email) = button.get_attribute("data-copy-email") else {
                    return;
                };
                let button = button.clone();
                spawn_local(async move {
                    match copy_text(&email).await {
                        Ok(()) => show_copied(&button),
                        Err(e) => log::warn!("Clipboard write failed: {}", e),
                    }
                });
            })
        };
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

async fn copy_text(text: &str) -> Result<()> {
    let clipboard = window()?.navigator().clipboard();
    JsFuture::from(clipboard.write_text(text)).await?;
    Ok(())
}

/// Swap the button label to "Copied!" and restore it after a moment
fn show_copied(button: &HtmlElement) {
    // A second click while the feedback shows keeps the real label
    if button.get_attribute("data-copy-label").is_none() {
        let label = button.text_content().unwrap_or_default();
        let _ = button.set_attribute("data-copy-label", &label);
    }
    button.set_text_content(Some("Copied!"));

    let restore = {
        let button = button.clone();
        Closure::once(move || {
            if let Some(label) = button.get_attribute("data-copy-label") {
                button.set_text_content(Some(&label));
                let _ = button.remove_attribute("data-copy-label");
            }
        })
    };
    if let Ok(window) = window() {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            restore.as_ref().unchecked_ref(),
            COPY_FEEDBACK_MS,
        );
    }
    restore.forget();
}

// ---------------------------------------------------------------------------
// Contact form

fn setup_contact_form() -> Result<()> {
    let document = document()?;
    for form in query_all(&document, CONTACT_SELECTOR)? {
        let Ok(form) = form.dyn_into::<HtmlFormElement>() else {
            continue;
        };
        let closure = {
            let form = form.clone();
            Closure::<dyn FnMut(_)>::new(move |event: Event| {
                event.prevent_default();
                let form = form.clone();
                spawn_local(async move {
                    submit_contact(form).await;
                });
            })
        };
        form.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

/// Every text entry of a form, in form order; file inputs are skipped
fn form_fields(data: &FormData) -> Result<Vec<(String, String)>> {
    let Some(entries) = js_sys::try_iter(data)? else {
        return Ok(Vec::new());
    };
    let mut fields = Vec::new();
    for entry in entries {
        let pair: js_sys::Array = entry?.unchecked_into();
        if let (Some(name), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) {
            fields.push((name, value));
        }
    }
    Ok(fields)
}

fn alert(message: &str) {
    if let Ok(window) = window() {
        let _ = window.alert_with_message(message);
    }
}

/// Submit button with the label it had before we touched it
#[derive(Clone)]
struct SubmitButton {
    el: Option<HtmlButtonElement>,
    label: String,
}

impl SubmitButton {
    fn find(form: &HtmlFormElement) -> Self {
        let el = form
            .query_selector("button[type=\"submit\"], button:not([type])")
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok());
        let label = el
            .as_ref()
            .and_then(|b| b.text_content())
            .unwrap_or_default();
        Self { el, label }
    }

    fn show(&self, state: SubmitState) {
        let Some(button) = &self.el else {
            return;
        };
        button.set_disabled(state.button_disabled());
        button.set_text_content(Some(state.button_label().unwrap_or(self.label.as_str())));
    }

    /// Show `state`, then whatever follows it once the feedback has been seen
    fn show_briefly(&self, state: SubmitState) {
        self.show(state);
        let restore = {
            let button = self.clone();
            Closure::once(move || button.show(state.after_feedback()))
        };
        if let Ok(window) = window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                restore.as_ref().unchecked_ref(),
                SUBMIT_FEEDBACK_MS,
            );
        }
        restore.forget();
    }
}

async fn submit_contact(form: HtmlFormElement) {
    let fields = FormData::new_with_form(&form)
        .map_err(FxError::from)
        .and_then(|data| form_fields(&data));
    let fields = match fields {
        Ok(fields) => fields,
        Err(e) => {
            log::error!("Couldn't read contact form: {}", e);
            return;
        }
    };

    let submission = ContactSubmission::from_fields(fields);
    if submission.is_spam() {
        // Pretend it worked
        log::debug!("Dropped contact submission with honeypot filled");
        form.reset();
        return;
    }

    let body = match submission.to_json() {
        Ok(body) => body,
        Err(FxError::InvalidSubmission(reason)) => {
            log::warn!("Contact form not sent: {}", reason);
            alert(&invalid_message(reason));
            return;
        }
        Err(e) => {
            log::error!("Couldn't encode contact form: {}", e);
            return;
        }
    };

    let button = SubmitButton::find(&form);
    button.show(SubmitState::Sending);

    match post_json(&form.action(), &body).await {
        Ok(()) => {
            log::info!("Contact form sent");
            button.show_briefly(SubmitState::Sent);
            form.reset();
        }
        Err(e) => {
            log::error!("Contact form failed: {}", e);
            button.show(SubmitState::Idle);
            let fallback = form.get_attribute("data-fallback-email").unwrap_or_default();
            alert(&failure_message(&fallback));
        }
    }
}

async fn post_json(url: &str, body: &str) -> Result<()> {
    let headers = Headers::new()?;
    headers.set("Content-Type", "application/json")?;
    headers.set("Accept", "application/json")?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(body));

    let request = Request::new_with_str_and_init(url, &init)?;
    let response: Response = JsFuture::from(window()?.fetch_with_request(&request))
        .await?
        .dyn_into()
        .map_err(|_| FxError::Js("fetch did not return a Response".into()))?;

    if response.ok() {
        Ok(())
    } else {
        Err(FxError::Http(response.status()))
    }
}
