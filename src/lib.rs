//! In-page table of contents with scrollspy.
//!
//! On document ready the crate collects the top-level headings of the
//! content region, gives each one a stable anchor id, renders a desktop
//! sidebar and a mobile chip row, and keeps the entry for the heading
//! nearest the top of the viewport marked active.
//!
//! ## Modules
//!
//! - [`slug`] - anchor ids from heading text, per-run uniqueness
//! - [`collector`] - heading discovery and id write-back
//! - [`nav`] - the two navigation surfaces (Leptos views)
//! - [`scroll`] - header offset and offset-aware smooth scrolling
//! - [`spy`] - visibility-driven active state
//! - [`config`] - defaults and the `window.ENV.TOC` override
//!
//! Everything that can fail degrades to a no-op: the page never sees an
//! exception from this crate, only debug logs.

pub mod collector;
pub mod config;
pub mod error;
pub mod nav;
pub mod scroll;
pub mod slug;
pub mod spy;

pub use collector::{collect_sections, Collection, HeadingNode, Section};
pub use config::TocConfig;
pub use error::TocError;
pub use nav::{build_navigation, NavEntry, NavLinks, NavMounts, RenderedNav};
pub use slug::{slugify, IdRegistry};
pub use spy::{ActiveMarker, ActiveTracker, Scrollspy, VisibilityChange, VisibilityNotifier};

use crate::error::{document, Result};
use crate::spy::IntersectionNotifier;
use serde::Serialize;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

/// One collection run that made it all the way to a live scrollspy.
pub struct TocRun {
    pub sections: Vec<Section<web_sys::Element>>,
    spy: Scrollspy<IntersectionNotifier, web_sys::Element>,
    nav: NavMounts,
}

impl TocRun {
    pub fn active(&self) -> Option<String> {
        self.spy.active()
    }

    /// Disconnect the spy and unmount both surfaces.
    pub fn stop(self) {
        self.spy.stop();
        drop(self.nav);
    }
}

thread_local! {
    static CURRENT: RefCell<Option<TocRun>> = const { RefCell::new(None) };
}

/// Collect, render and spy. `Ok(None)` when the page has nothing to navigate.
pub fn build_toc(config: &TocConfig) -> Result<Option<TocRun>> {
    let document = document()?;
    let Some(content) = collector::find_content(&document, config) else {
        log::debug!("no content region for {:?}", config.content_selector);
        return Ok(None);
    };

    let headings = collector::query_headings(&content, config)?;
    let collection = collect_sections(headings, config.min_heading_len);
    if collection.is_empty() {
        log::debug!("no qualifying headings");
        return Ok(None);
    }

    let nav = build_navigation(&document, &content, &collection.sections, config)?;

    let window = error::window()?;
    let offset = scroll::measure_header_offset(&window, &document, config);
    let spy = spy::start_browser_spy(&collection.sections, nav.links, offset, config)?;

    log::info!("table of contents ready: {} sections", collection.sections.len());
    Ok(Some(TocRun {
        sections: collection.sections,
        spy,
        nav: nav.mounts,
    }))
}

fn replace_current(config: &TocConfig) {
    if let Some(prev) = CURRENT.with(|c| c.borrow_mut().take()) {
        prev.stop();
    }

    match build_toc(config) {
        Ok(run) => CURRENT.with(|c| *c.borrow_mut() = run),
        Err(e) => log::warn!("table of contents not built: {e}"),
    }
}

fn initialize() {
    let config = TocConfig::from_window();

    match scroll::refresh_offset(&config) {
        Ok(v) => log::debug!("header offset {}", scroll::format_px(v)),
        Err(e) => log::debug!("header offset not published: {e}"),
    }
    if let Err(e) = scroll::HeaderWatcher::start(&config) {
        log::debug!("header watcher not started: {e}");
    }

    replace_current(&config);
}

fn on_document_ready(f: impl FnOnce() + 'static) {
    let Ok(document) = document() else {
        return;
    };

    if document.ready_state() != "loading" {
        f();
        return;
    }

    let cb = wasm_bindgen::closure::Closure::once_into_js(f);
    if document
        .add_event_listener_with_callback("DOMContentLoaded", cb.unchecked_ref())
        .is_err()
    {
        log::warn!("could not wait for DOMContentLoaded");
    }
}

/// Rebuild after the host page replaced its content.
///
/// Headings keep the ids written by earlier runs.
#[wasm_bindgen(js_name = refreshToc)]
pub fn refresh_toc() {
    replace_current(&TocConfig::from_window());
}

#[derive(Serialize)]
struct SectionInfo<'a> {
    id: &'a str,
    label: &'a str,
}

fn sections_json<H>(sections: &[Section<H>]) -> String {
    let infos: Vec<SectionInfo<'_>> = sections
        .iter()
        .map(|s| SectionInfo {
            id: &s.id,
            label: &s.label,
        })
        .collect();
    serde_json::to_string(&infos).unwrap_or_else(|_| "[]".to_string())
}

/// Sections of the live table of contents as a JSON array of `{id, label}`.
#[wasm_bindgen(js_name = tocSections)]
pub fn toc_sections() -> String {
    CURRENT.with(|c| match c.borrow().as_ref() {
        Some(run) => sections_json(&run.sections),
        None => "[]".to_string(),
    })
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();

    #[cfg(feature = "console-logging")]
    {
        console_log::init_with_level(log::Level::Debug).ok();
    }

    on_document_ready(initialize);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fixture(id: &str, html: &str) -> web_sys::Element {
        let doc = document().expect("document");
        let el = doc.create_element("div").expect("create div");
        el.set_id(id);
        el.set_inner_html(html);
        doc.body()
            .expect("body")
            .append_child(&el)
            .expect("append fixture");
        el
    }

    fn config_for(prefix: &str) -> TocConfig {
        TocConfig {
            content_selector: format!("#{prefix}"),
            desktop_id: format!("{prefix}-desktop"),
            mobile_id: format!("{prefix}-mobile"),
            header_selectors: vec![format!(".{prefix}-header")],
            ..TocConfig::default()
        }
    }

    fn count(selector: &str) -> u32 {
        document()
            .expect("document")
            .query_selector_all(selector)
            .expect("valid selector")
            .length()
    }

    #[wasm_bindgen_test]
    fn test_build_assigns_ids_and_renders_both_surfaces() {
        let root = fixture(
            "toc-a",
            r#"<h2>Overview</h2><p>x</p><h2>Overview</h2><h2>H</h2><h2 id="custom">Setup</h2>"#,
        );
        let cfg = config_for("toc-a");

        let run = build_toc(&cfg).expect("build").expect("sections");
        let ids: Vec<&str> = run.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["overview", "overview-2", "custom"]);

        let headings = root.query_selector_all("h2").expect("h2s");
        let second = headings
            .item(1)
            .and_then(|n| n.dyn_into::<web_sys::Element>().ok())
            .expect("second heading");
        assert_eq!(second.id(), "overview-2");

        assert_eq!(count("#toc-a-desktop ol li a"), 3);
        assert_eq!(count("#toc-a-mobile a.toc-chip"), 3);
        assert_eq!(count("#toc-a-desktop a[href='#overview-2']"), 1);

        // Desktop surface is the first child of the content region.
        let first = root.first_element_child().expect("first child");
        assert_eq!(first.id(), "toc-a-desktop");

        assert_eq!(run.active().as_deref(), Some("overview"));
        assert_eq!(count("#toc-a-desktop a.active"), 1);
        assert_eq!(count("#toc-a-mobile a.active"), 1);

        run.stop();
        root.remove();
    }

    #[wasm_bindgen_test]
    fn test_rebuild_does_not_duplicate_links() {
        let root = fixture("toc-b", "<h2>Alpha</h2><h2>Beta</h2>");
        let cfg = config_for("toc-b");

        let first = build_toc(&cfg).expect("build").expect("sections");
        assert_eq!(count("#toc-b-desktop a"), 2);
        first.stop();
        // Stopping unmounts the views; the surfaces themselves stay for reuse.
        assert_eq!(count("#toc-b-desktop a"), 0);
        assert_eq!(count("#toc-b-mobile a"), 0);
        assert_eq!(count("#toc-b-desktop"), 1);

        let second = build_toc(&cfg).expect("rebuild").expect("sections");

        assert_eq!(count("#toc-b-desktop a"), 2);
        assert_eq!(count("#toc-b-mobile a"), 2);
        assert_eq!(count("#toc-b-desktop"), 1);
        let ids: Vec<&str> = second.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);

        second.stop();
        root.remove();
    }

    #[wasm_bindgen_test]
    fn test_missing_content_or_headings_is_noop() {
        let cfg = config_for("toc-missing");
        assert!(build_toc(&cfg).expect("no error").is_none());

        let root = fixture("toc-c", "<h2>X</h2><p>no headings</p>");
        let cfg = config_for("toc-c");
        assert!(build_toc(&cfg).expect("no error").is_none());
        assert_eq!(count("#toc-c-desktop"), 0);
        root.remove();
    }

    #[wasm_bindgen_test]
    fn test_fixed_header_offset_is_published() {
        let cfg = config_for("toc-d");
        assert_eq!(scroll::refresh_offset(&cfg).expect("refresh"), 0.0);

        let header = fixture("toc-d-fixture", "");
        header.set_class_name("toc-d-header");
        header
            .set_attribute(
                "style",
                "position:fixed;top:0;left:0;height:64px;margin:0;padding:0;border:0",
            )
            .expect("style");

        assert_eq!(scroll::refresh_offset(&cfg).expect("refresh"), 64.0);
        assert_eq!(published(&cfg.offset_property), "64px");

        header.remove();
    }

    fn published(property: &str) -> String {
        document()
            .expect("document")
            .document_element()
            .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
            .expect("html element")
            .style()
            .get_property_value(property)
            .expect("property")
    }

    async fn sleep_ms(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            web_sys::window()
                .expect("window")
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
                .expect("set timeout");
        });
        wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .expect("timer");
    }

    fn dispatch_click(link: &web_sys::Element, ctrl: bool) {
        let init = web_sys::MouseEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_button(0);
        init.set_ctrl_key(ctrl);
        let ev = web_sys::MouseEvent::new_with_mouse_event_init_dict("click", &init)
            .expect("mouse event");
        link.dispatch_event(&ev).expect("dispatch");
    }

    #[wasm_bindgen_test]
    fn test_link_click_prevents_default_unless_modified() {
        let root = fixture("toc-e", "<h2>Alpha</h2><h2>Beta</h2>");
        let cfg = config_for("toc-e");
        let run = build_toc(&cfg).expect("build").expect("sections");

        let link = document()
            .expect("document")
            .query_selector("#toc-e-desktop a[href='#beta']")
            .expect("valid selector")
            .expect("beta link");

        // Window sees the event last: record what the link handler did, then
        // stop the browser from following the anchor either way.
        let seen = std::rc::Rc::new(std::cell::Cell::new(None::<bool>));
        let sink = std::rc::Rc::clone(&seen);
        let last = wasm_bindgen::closure::Closure::<dyn FnMut(web_sys::Event)>::new(
            move |ev: web_sys::Event| {
                sink.set(Some(ev.default_prevented()));
                ev.prevent_default();
            },
        );
        let window = web_sys::window().expect("window");
        window
            .add_event_listener_with_callback("click", last.as_ref().unchecked_ref())
            .expect("listen");

        dispatch_click(&link, false);
        assert_eq!(seen.get(), Some(true));

        seen.set(None);
        dispatch_click(&link, true);
        assert_eq!(seen.get(), Some(false));

        window
            .remove_event_listener_with_callback("click", last.as_ref().unchecked_ref())
            .expect("unlisten");
        run.stop();
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn test_header_resize_republishes_offset() {
        let cfg = TocConfig {
            offset_property: "--toc-watch-offset".to_string(),
            ..config_for("toc-f")
        };
        let header = fixture("toc-f-fixture", "");
        header.set_class_name("toc-f-header");
        header
            .set_attribute(
                "style",
                "position:fixed;top:0;left:0;height:64px;margin:0;padding:0;border:0",
            )
            .expect("style");

        scroll::HeaderWatcher::start(&cfg).expect("watch headers");
        sleep_ms(100).await;
        assert_eq!(published(&cfg.offset_property), "64px");

        header
            .set_attribute(
                "style",
                "position:fixed;top:0;left:0;height:80px;margin:0;padding:0;border:0",
            )
            .expect("style");
        sleep_ms(100).await;
        assert_eq!(published(&cfg.offset_property), "80px");

        header.remove();
    }

    #[wasm_bindgen_test]
    fn test_config_reads_window_env_override() {
        let window = web_sys::window().expect("window");

        let env = js_sys::JSON::parse(r#"{"TOC": {"title": "Contents", "min_heading_len": 3}}"#)
            .expect("json");
        js_sys::Reflect::set(&window, &"ENV".into(), &env).expect("set ENV");
        let cfg = TocConfig::from_window();
        assert_eq!(cfg.title, "Contents");
        assert_eq!(cfg.min_heading_len, 3);
        assert_eq!(cfg.desktop_id, "toc-desktop");

        let bad = js_sys::JSON::parse(r#"{"TOC": {"min_heading_len": "two"}}"#).expect("json");
        js_sys::Reflect::set(&window, &"ENV".into(), &bad).expect("set ENV");
        assert_eq!(TocConfig::from_window(), TocConfig::default());

        js_sys::Reflect::delete_property(&window, &"ENV".into()).expect("delete ENV");
        assert_eq!(TocConfig::from_window(), TocConfig::default());
    }

    #[wasm_bindgen_test]
    fn test_scroll_to_missing_id_is_noop() {
        let cfg = TocConfig::default();
        assert!(scroll::scroll_to_id("does-not-exist", &cfg).is_ok());
    }
}
