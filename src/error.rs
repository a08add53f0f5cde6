//! Error type shared by configuration, form handling and the DOM bindings

use thiserror::Error;

/// Everything that can go wrong outside the physics step itself
#[derive(Debug, Error)]
pub enum FxError {
    /// A required DOM node or browser object was missing
    #[error("missing {0}")]
    Missing(&'static str),

    /// A browser API threw; holds the stringified JS value
    #[error("js error: {0}")]
    Js(String),

    /// Physics configuration JSON failed to parse
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Physics configuration parsed but holds unusable values
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Contact form submission is incomplete
    #[error("invalid submission: {0}")]
    InvalidSubmission(&'static str),

    /// Contact endpoint answered with a non-success status
    #[error("endpoint returned HTTP {0}")]
    Http(u16),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, FxError>;

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for FxError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        FxError::Js(
            value
                .as_string()
                .unwrap_or_else(|| format!("{:?}", value)),
        )
    }
}
