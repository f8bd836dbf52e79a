use crate::config::TocConfig;
use crate::error::{document, window, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Computed layout facts about one header candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderSample {
    pub position: String,
    pub height: f64,
}

impl HeaderSample {
    fn reserves_space(&self) -> bool {
        matches!(self.position.trim(), "fixed" | "sticky")
    }
}

/// Total height of the fixed/sticky samples.
pub fn header_offset<'a>(samples: impl IntoIterator<Item = &'a HeaderSample>) -> f64 {
    samples
        .into_iter()
        .filter(|s| s.reserves_space())
        .map(|s| s.height.max(0.0))
        .sum()
}

/// Document scroll position that puts `absolute_top` just below the header.
pub fn scroll_target(absolute_top: f64, offset: f64, margin: f64) -> f64 {
    (absolute_top - offset - margin).max(0.0)
}

pub fn format_px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}px", value as i64)
    } else {
        format!("{value}px")
    }
}

/// First element per header selector, skipping ones an earlier selector already matched.
fn header_elements(document: &web_sys::Document, config: &TocConfig) -> Vec<web_sys::Element> {
    let mut out: Vec<web_sys::Element> = Vec::new();
    for selector in &config.header_selectors {
        let Ok(Some(el)) = document.query_selector(selector) else {
            continue;
        };
        if !out.contains(&el) {
            out.push(el);
        }
    }
    out
}

fn sample(window: &web_sys::Window, el: &web_sys::Element) -> Option<HeaderSample> {
    let style = window.get_computed_style(el).ok().flatten()?;
    let position = style.get_property_value("position").ok()?;
    let height = el.get_bounding_client_rect().height();
    Some(HeaderSample { position, height })
}

pub fn measure_header_offset(
    window: &web_sys::Window,
    document: &web_sys::Document,
    config: &TocConfig,
) -> f64 {
    let samples: Vec<HeaderSample> = header_elements(document, config)
        .iter()
        .filter_map(|el| sample(window, el))
        .collect();
    header_offset(&samples)
}

pub fn publish_offset(document: &web_sys::Document, config: &TocConfig, value: f64) -> Result<()> {
    let Some(root) = document
        .document_element()
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
    else {
        return Ok(());
    };
    root.style()
        .set_property(&config.offset_property, &format_px(value))?;
    Ok(())
}

/// Measure and publish the header offset.
pub fn refresh_offset(config: &TocConfig) -> Result<f64> {
    let window = window()?;
    let document = document()?;
    let value = measure_header_offset(&window, &document, config);
    publish_offset(&document, config, value)?;
    Ok(value)
}

/// Smooth-scroll so the element with `id` lands below the header. Absent targets are ignored.
///
/// The header offset is measured at call time, so it tracks headers that
/// changed size since startup.
pub fn scroll_to_id(id: &str, config: &TocConfig) -> Result<()> {
    let window = window()?;
    let document = document()?;
    let Some(target) = document.get_element_by_id(id) else {
        log::debug!("scroll target #{id} not found");
        return Ok(());
    };

    let offset = measure_header_offset(&window, &document, config);

    let absolute_top = target.get_bounding_client_rect().top() + window.scroll_y()?;
    let top = scroll_target(absolute_top, offset, config.scroll_margin);

    let opts = web_sys::ScrollToOptions::new();
    opts.set_top(top);
    opts.set_behavior(web_sys::ScrollBehavior::Smooth);
    window.scroll_to_with_scroll_to_options(&opts);
    Ok(())
}

/// Keeps the published offset in step with header size changes.
///
/// Lives for the page lifetime; the observer and its closure are leaked.
pub struct HeaderWatcher;

impl HeaderWatcher {
    pub fn start(config: &TocConfig) -> Result<()> {
        let document = document()?;
        let headers = header_elements(&document, config);
        if headers.is_empty() {
            return Ok(());
        }

        let cfg = config.clone();
        let cb = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries: js_sys::Array| {
            match refresh_offset(&cfg) {
                Ok(v) => log::debug!("header offset now {}", format_px(v)),
                Err(e) => log::debug!("header offset refresh failed: {e}"),
            }
        });

        let observer = web_sys::ResizeObserver::new(cb.as_ref().unchecked_ref())?;
        for el in &headers {
            observer.observe(el);
        }

        cb.forget();
        log::debug!("watching {} header element(s)", headers.len());
        Ok(())
    }
}
