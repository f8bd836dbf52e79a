use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures inside the DOM plumbing.
///
/// None of these cross the public boundary: `start`/`refresh` log them and
/// leave the page as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TocError {
    #[error("no global window")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("javascript error: {0}")]
    Js(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<JsValue> for TocError {
    fn from(value: JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&value, &"message".into())
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{value:?}"));
        Self::Js(message)
    }
}

impl From<serde_json::Error> for TocError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TocError>;

pub(crate) fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or(TocError::NoWindow)
}

pub(crate) fn document() -> Result<web_sys::Document> {
    window()?.document().ok_or(TocError::NoDocument)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(TocError::NoWindow.to_string(), "no global window");
        assert_eq!(
            TocError::Config("bad".to_string()).to_string(),
            "invalid configuration: bad"
        );
    }

    #[test]
    fn test_from_serde_json_error_is_config() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(TocError::from(err), TocError::Config(_)));
    }
}
