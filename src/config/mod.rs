use crate::error::{Result, TocError};
use serde::Deserialize;

/// Selectors, ids and constants driving the table of contents.
///
/// Defaults match the stock page layout. A host page may override any field
/// through `window.ENV.TOC` (snake_case keys); absent keys keep their default.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TocConfig {
    pub content_selector: String,
    pub heading_selector: String,
    pub desktop_id: String,
    pub mobile_id: String,
    pub title: String,

    /// Headings with fewer trimmed characters are skipped.
    pub min_heading_len: usize,

    pub active_class: String,
    pub offset_property: String,

    /// Candidates for fixed/sticky page chrome, checked in order.
    pub header_selectors: Vec<String>,

    /// Extra gap (px) left between the header and the scrolled-to heading.
    pub scroll_margin: f64,

    /// Activation band: top inset past the header (px), bottom inset (% of viewport).
    pub spy_top_margin: f64,
    pub spy_bottom_percent: f64,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            content_selector: "#content".to_string(),
            heading_selector: "h2".to_string(),
            desktop_id: "toc-desktop".to_string(),
            mobile_id: "toc-mobile".to_string(),
            title: "On this page".to_string(),
            min_heading_len: 2,
            active_class: "active".to_string(),
            offset_property: "--toc-header-offset".to_string(),
            header_selectors: vec![
                "header".to_string(),
                ".site-header".to_string(),
                ".navbar".to_string(),
                "#header".to_string(),
            ],
            scroll_margin: 8.0,
            spy_top_margin: 24.0,
            spy_bottom_percent: 70.0,
        }
    }
}

impl TocConfig {
    /// Parse an override object; missing keys fall back to the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validated()
    }

    /// Defaults overlaid with `window.ENV.TOC`, if the page sets one.
    pub fn from_window() -> Self {
        match Self::read_window_override() {
            Ok(Some(cfg)) => cfg,
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("ignoring window.ENV.TOC: {e}");
                Self::default()
            }
        }
    }

    fn read_window_override() -> Result<Option<Self>> {
        let Some(window) = web_sys::window() else {
            return Ok(None);
        };
        let Some(env) = window.get("ENV") else {
            return Ok(None);
        };
        if env.is_undefined() || !env.is_object() {
            return Ok(None);
        }

        let toc = js_sys::Reflect::get(&env, &"TOC".into())?;
        if toc.is_undefined() || toc.is_null() {
            return Ok(None);
        }

        let json = js_sys::JSON::stringify(&toc)?
            .as_string()
            .ok_or_else(|| TocError::Config("TOC is not serializable".to_string()))?;
        Self::from_json(&json).map(Some)
    }

    fn validated(self) -> Result<Self> {
        if self.content_selector.trim().is_empty() {
            return Err(TocError::Config("content_selector is empty".to_string()));
        }
        if self.desktop_id.trim().is_empty() || self.mobile_id.trim().is_empty() {
            return Err(TocError::Config("surface ids must not be empty".to_string()));
        }
        if self.desktop_id == self.mobile_id {
            return Err(TocError::Config(
                "desktop_id and mobile_id must differ".to_string(),
            ));
        }
        if !self.offset_property.starts_with("--") {
            return Err(TocError::Config(
                "offset_property must be a custom property (--name)".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.spy_bottom_percent) {
            return Err(TocError::Config(
                "spy_bottom_percent must be within 0..=100".to_string(),
            ));
        }
        Ok(self)
    }
}
