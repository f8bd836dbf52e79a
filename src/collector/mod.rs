use crate::config::TocConfig;
use crate::error::Result;
use crate::slug::{slugify, IdRegistry};
use wasm_bindgen::JsCast;

/// A heading as the collector sees it.
///
/// `write_id` is the only side effect the collector performs on the page.
pub trait HeadingNode {
    fn existing_id(&self) -> Option<String>;
    fn text(&self) -> String;
    fn write_id(&self, id: &str);
}

impl HeadingNode for web_sys::Element {
    fn existing_id(&self) -> Option<String> {
        let id = self.id();
        if id.trim().is_empty() {
            None
        } else {
            Some(id)
        }
    }

    fn text(&self) -> String {
        self.text_content().unwrap_or_default()
    }

    fn write_id(&self, id: &str) {
        self.set_id(id);
    }
}

/// One navigable unit derived from a qualifying heading.
#[derive(Clone, Debug, PartialEq)]
pub struct Section<H> {
    pub id: String,
    pub label: String,
    pub heading: H,
}

/// Result of one collection run.
#[derive(Clone, Debug)]
pub struct Collection<H> {
    pub sections: Vec<Section<H>>,
    pub ids: IdRegistry,
}

impl<H> Collection<H> {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Build sections from headings in document order.
///
/// Headings whose trimmed label is shorter than `min_len` characters are
/// skipped. Resolved ids are written back when they differ from the heading's own.
pub fn collect_sections<H, I>(headings: I, min_len: usize) -> Collection<H>
where
    H: HeadingNode,
    I: IntoIterator<Item = H>,
{
    let mut ids = IdRegistry::new();
    let mut sections = Vec::new();

    for heading in headings {
        let label = heading.text().trim().to_string();
        if label.chars().count() < min_len {
            continue;
        }

        // Compare against the raw attribute: a padded id still needs rewriting.
        let raw = heading.existing_id();
        let candidate = match raw.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => slugify(&label),
        };
        let id = ids.claim(&candidate);

        if raw.as_deref() != Some(id.as_str()) {
            heading.write_id(&id);
        }

        sections.push(Section { id, label, heading });
    }

    log::debug!("collected {} sections", sections.len());
    Collection { sections, ids }
}

/// The content region, if the page has one.
pub fn find_content(document: &web_sys::Document, config: &TocConfig) -> Option<web_sys::HtmlElement> {
    document
        .query_selector(&config.content_selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
}

/// Headings inside the content region, in document order.
///
/// Generated surfaces live inside the content region too, so anything under
/// them is excluded.
pub fn query_headings(content: &web_sys::Element, config: &TocConfig) -> Result<Vec<web_sys::Element>> {
    let list = content.query_selector_all(&config.heading_selector)?;
    let surfaces = [config.desktop_id.as_str(), config.mobile_id.as_str()];

    let mut out = Vec::with_capacity(list.length() as usize);
    for i in 0..list.length() {
        let Some(el) = list
            .item(i)
            .and_then(|n| n.dyn_into::<web_sys::Element>().ok())
        else {
            continue;
        };
        let inside_surface = surfaces.iter().any(|id| {
            el.closest(&format!("#{id}"))
                .ok()
                .flatten()
                .is_some()
        });
        if !inside_surface {
            out.push(el);
        }
    }
    Ok(out)
}
