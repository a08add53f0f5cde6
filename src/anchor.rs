//! In-page anchor navigation

/// Where a fragment link points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorTarget {
    /// `#` or `#top`
    Top,
    /// `#some-id`
    Element(String),
}

/// Parse the fragment of an `href`; None for links that leave the page
pub fn parse_fragment(href: &str) -> Option<AnchorTarget> {
    let fragment = href.strip_prefix('#')?;
    match fragment {
        "" | "top" => Some(AnchorTarget::Top),
        id => Some(AnchorTarget::Element(id.to_string())),
    }
}

/// How the page scrolls to an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    Smooth,
    Instant,
}

impl ScrollMode {
    pub fn from_reduced_motion(reduced_motion: bool) -> Self {
        if reduced_motion {
            ScrollMode::Instant
        } else {
            ScrollMode::Smooth
        }
    }
}

/// Document scroll offset that puts an element just below a sticky header
pub fn scroll_target(element_top: f64, scroll_y: f64, header_height: f64, max_scroll: f64) -> f64 {
    (element_top + scroll_y - header_height).clamp(0.0, max_scroll.max(0.0))
}
