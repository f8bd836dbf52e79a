use crate::collector::Section;
use crate::config::TocConfig;
use crate::error::Result;
use crate::scroll::scroll_to_id;
use leptos::prelude::*;
use std::any::Any;
use std::collections::HashMap;
use wasm_bindgen::JsCast;

/// Section id -> every rendered link (desktop + mobile) that targets it.
pub type NavLinks<L> = HashMap<String, Vec<L>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavEntry {
    pub id: String,
    pub label: String,
}

impl NavEntry {
    pub fn href(&self) -> String {
        href_for(&self.id)
    }
}

pub fn href_for(id: &str) -> String {
    format!("#{id}")
}

pub fn entries<H>(sections: &[Section<H>]) -> Vec<NavEntry> {
    sections
        .iter()
        .map(|s| NavEntry {
            id: s.id.clone(),
            label: s.label.clone(),
        })
        .collect()
}

/// Group links by the section id their href points at.
///
/// Links whose href is not `#<id>` for a known id are left out.
pub fn index_links<L>(ids: &[String], links: impl IntoIterator<Item = (String, L)>) -> NavLinks<L> {
    let mut map: NavLinks<L> = ids.iter().map(|id| (id.clone(), Vec::new())).collect();
    for (href, link) in links {
        let Some(id) = href.strip_prefix('#') else {
            continue;
        };
        if let Some(bucket) = map.get_mut(id) {
            bucket.push(link);
        }
    }
    map
}

/// Unmodified main-button click, the only one turned into a smooth scroll.
pub fn is_plain_click(button: i16, modified: bool) -> bool {
    button == 0 && !modified
}

/// Replace the default anchor jump with an offset-aware smooth scroll.
///
/// Only primary activation is intercepted: modifier keys or other buttons
/// keep the browser's default (new tab, new window, download).
fn on_link_click(ev: web_sys::MouseEvent, id: &str, config: &TocConfig) {
    let modified = ev.ctrl_key() || ev.meta_key() || ev.shift_key() || ev.alt_key();
    if !is_plain_click(ev.button(), modified) {
        return;
    }
    ev.prevent_default();
    if let Err(e) = scroll_to_id(id, config) {
        log::debug!("scroll to #{id} failed: {e}");
    }
}

#[component]
fn DesktopToc(title: String, entries: Vec<NavEntry>, config: TocConfig) -> impl IntoView {
    view! {
        <p class="toc-title">{title}</p>
        <ol class="toc-list">
            {entries
                .into_iter()
                .map(|entry| {
                    let href = entry.href();
                    let id = entry.id;
                    let cfg = config.clone();
                    view! {
                        <li class="toc-item">
                            <a
                                class="toc-link"
                                href=href
                                on:click=move |ev: web_sys::MouseEvent| on_link_click(ev, &id, &cfg)
                            >
                                {entry.label}
                            </a>
                        </li>
                    }
                })
                .collect_view()}
        </ol>
    }
}

#[component]
fn MobileToc(entries: Vec<NavEntry>, config: TocConfig) -> impl IntoView {
    entries
        .into_iter()
        .map(|entry| {
            let href = entry.href();
            let id = entry.id;
            let cfg = config.clone();
            view! {
                <a
                    class="toc-chip"
                    href=href
                    on:click=move |ev: web_sys::MouseEvent| on_link_click(ev, &id, &cfg)
                >
                    {entry.label}
                </a>
            }
        })
        .collect_view()
}

/// Surface with `id`, created as the first child of `content` when the page lacks one.
pub fn ensure_surface(
    document: &web_sys::Document,
    content: &web_sys::Element,
    id: &str,
    class: &str,
    label: &str,
) -> Result<web_sys::HtmlElement> {
    if let Some(existing) = document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
    {
        return Ok(existing);
    }

    let nav = document.create_element("nav")?;
    nav.set_id(id);
    nav.set_class_name(class);
    nav.set_attribute("aria-label", label)?;
    content.insert_before(&nav, content.first_child().as_ref())?;
    log::debug!("created navigation surface #{id}");

    Ok(nav.unchecked_into::<web_sys::HtmlElement>())
}

fn rendered_links(surface: &web_sys::Element) -> Result<Vec<(String, web_sys::Element)>> {
    let list = surface.query_selector_all("a[href]")?;
    let mut out = Vec::with_capacity(list.length() as usize);
    for i in 0..list.length() {
        let Some(link) = list
            .item(i)
            .and_then(|n| n.dyn_into::<web_sys::Element>().ok())
        else {
            continue;
        };
        if let Some(href) = link.get_attribute("href") {
            out.push((href, link));
        }
    }
    Ok(out)
}

/// Mounted surface views. Dropping this unmounts them and releases their owners.
pub struct NavMounts {
    handles: Vec<Box<dyn Any>>,
}

impl NavMounts {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Both rendered surfaces: the link index for the spy and the mounts keeping them alive.
pub struct RenderedNav {
    pub links: NavLinks<web_sys::Element>,
    pub mounts: NavMounts,
}

/// Render both surfaces from `sections`, replacing whatever they held before.
///
/// The views stay mounted while the returned [`NavMounts`] is alive.
pub fn build_navigation<H>(
    document: &web_sys::Document,
    content: &web_sys::Element,
    sections: &[Section<H>],
    config: &TocConfig,
) -> Result<RenderedNav> {
    // Mobile first so the desktop surface ends up as the very first child.
    let mobile = ensure_surface(document, content, &config.mobile_id, "toc-mobile", &config.title)?;
    let desktop = ensure_surface(document, content, &config.desktop_id, "toc-desktop", &config.title)?;

    let items = entries(sections);

    // Host-provided placeholder markup; earlier views were unmounted with their `NavMounts`.
    desktop.set_inner_html("");
    mobile.set_inner_html("");

    let mut handles: Vec<Box<dyn Any>> = Vec::with_capacity(2);

    let (title, list, cfg) = (config.title.clone(), items.clone(), config.clone());
    handles.push(Box::new(leptos::mount::mount_to(desktop.clone(), move || {
        view! { <DesktopToc title=title entries=list config=cfg /> }
    })));

    let (list, cfg) = (items, config.clone());
    handles.push(Box::new(leptos::mount::mount_to(mobile.clone(), move || {
        view! { <MobileToc entries=list config=cfg /> }
    })));

    let ids: Vec<String> = sections.iter().map(|s| s.id.clone()).collect();
    let mut links = rendered_links(&desktop)?;
    links.extend(rendered_links(&mobile)?);

    Ok(RenderedNav {
        links: index_links(&ids, links),
        mounts: NavMounts { handles },
    })
}
