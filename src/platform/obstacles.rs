//! Obstacle provider backed by page layout
//!
//! `[data-obstacle]` elements become inset rectangles. `img[data-mask]`
//! elements become alpha-mask obstacles; each image is drawn once to an
//! offscreen canvas and its alpha channel kept until the element leaves the page.

use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlImageElement};

use super::{document, scroll_offset};
use crate::config::CoordinateSpace;
use crate::error::{FxError, Result};
use crate::sim::{AlphaMask, Obstacle, ObstacleSource, Rect};

const OBSTACLE_SELECTOR: &str = "[data-obstacle]";
const MASK_SELECTOR: &str = "img[data-mask]";
/// Attribute tagging an image with its mask cache key
const MASK_ID_ATTR: &str = "data-mask-id";

/// Scans the page for obstacles
pub struct DomObstacleSource {
    space: CoordinateSpace,
    /// Mask per tagged image; None when the image can't be read (cross-origin)
    masks: HashMap<u32, Option<Rc<AlphaMask>>>,
    next_mask_id: u32,
    canvas: Option<(HtmlCanvasElement, CanvasRenderingContext2d)>,
}

impl DomObstacleSource {
    pub fn new(space: CoordinateSpace) -> Self {
        Self {
            space,
            masks: HashMap::new(),
            next_mask_id: 1,
            canvas: None,
        }
    }

    /// Layout box of an element in simulation space
    fn layout_rect(&self, el: &Element) -> Rect {
        let r = el.get_bounding_client_rect();
        let (sx, sy) = match self.space {
            CoordinateSpace::Viewport => (0.0, 0.0),
            CoordinateSpace::Document => scroll_offset(),
        };
        Rect::from_xywh(
            r.left() as f32 + sx,
            r.top() as f32 + sy,
            r.width() as f32,
            r.height() as f32,
        )
    }

    fn scan(&mut self) -> Result<Vec<Obstacle>> {
        let document = document()?;
        let mut obstacles = Vec::new();

        for el in query_all(&document, OBSTACLE_SELECTOR)? {
            if let Some(obstacle) = Obstacle::from_layout(self.layout_rect(&el)) {
                obstacles.push(obstacle);
            }
        }

        let mut seen = Vec::new();
        for el in query_all(&document, MASK_SELECTOR)? {
            let Ok(img) = el.dyn_into::<HtmlImageElement>() else {
                continue;
            };
            let Some((id, mask)) = self.mask_for(&document, &img) else {
                continue;
            };
            seen.push(id);
            let Some(mask) = mask else {
                continue;
            };
            if let Some(obstacle) = Obstacle::masked(self.layout_rect(&img), mask) {
                obstacles.push(obstacle);
            }
        }
        // Images that left the page take their masks with them
        self.masks.retain(|id, _| seen.contains(id));

        Ok(obstacles)
    }

    /// Cached mask for an image, rasterizing it on first use
    ///
    /// None while the image is still loading. An image that loaded but can't
    /// be read is remembered as unusable and never sampled again.
    fn mask_for(
        &mut self,
        document: &Document,
        img: &HtmlImageElement,
    ) -> Option<(u32, Option<Rc<AlphaMask>>)> {
        let cached_id = img
            .get_attribute(MASK_ID_ATTR)
            .and_then(|v| v.parse::<u32>().ok());
        if let Some(id) = cached_id {
            if let Some(entry) = self.masks.get(&id) {
                return Some((id, entry.clone()));
            }
        }

        if !img.complete() || img.natural_width() == 0 || img.natural_height() == 0 {
            // Not loaded yet; try again on a later scan
            return None;
        }

        let id = cached_id.unwrap_or_else(|| {
            let id = self.next_mask_id;
            self.next_mask_id += 1;
            id
        });
        let _ = img.set_attribute(MASK_ID_ATTR, &id.to_string());

        let entry = match self.rasterize(document, img) {
            Ok(mask) => {
                log::debug!("Cached {}x{} mask #{}", mask.width, mask.height, id);
                Some(Rc::new(mask))
            }
            Err(e) => {
                log::debug!("No mask for {}: {}", img.src(), e);
                None
            }
        };
        self.masks.insert(id, entry.clone());
        Some((id, entry))
    }

    /// Offscreen canvas used for every mask, created on first use
    fn offscreen(&mut self, document: &Document) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d)> {
        if let Some(pair) = &self.canvas {
            return Ok(pair.clone());
        }
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")?
            .dyn_into()
            .map_err(|_| FxError::Missing("canvas element"))?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or(FxError::Missing("2d context"))?
            .dyn_into()
            .map_err(|_| FxError::Missing("2d context"))?;
        self.canvas = Some((canvas.clone(), ctx.clone()));
        Ok((canvas, ctx))
    }

    /// Draw an image to the offscreen canvas and read back its alpha channel
    fn rasterize(&mut self, document: &Document, img: &HtmlImageElement) -> Result<AlphaMask> {
        let (canvas, ctx) = self.offscreen(document)?;

        let (w, h) = (img.natural_width(), img.natural_height());
        canvas.set_width(w);
        canvas.set_height(h);
        ctx.clear_rect(0.0, 0.0, w as f64, h as f64);
        ctx.draw_image_with_html_image_element(img, 0.0, 0.0)?;
        // Throws on cross-origin images (tainted canvas)
        let data = ctx.get_image_data(0.0, 0.0, w as f64, h as f64)?;
        AlphaMask::from_rgba(w, h, &data.data().0).ok_or(FxError::Missing("mask pixels"))
    }
}

impl ObstacleSource for DomObstacleSource {
    fn collect(&mut self) -> Vec<Obstacle> {
        self.scan().unwrap_or_else(|e| {
            log::warn!("Obstacle scan failed: {}", e);
            Vec::new()
        })
    }
}

/// All elements matching a selector
pub fn query_all(document: &Document, selector: &str) -> Result<Vec<Element>> {
    let list = document.query_selector_all(selector)?;
    Ok((0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}
