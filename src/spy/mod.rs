use crate::collector::Section;
use crate::config::TocConfig;
use crate::error::Result;
use crate::nav::NavLinks;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// One visibility report for an observed heading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilityChange {
    pub id: String,
    pub intersecting: bool,
}

/// Source of heading visibility reports.
///
/// Implementations deliver batches of [`VisibilityChange`] to the callback
/// they were built with; the spy only registers and releases targets.
pub trait VisibilityNotifier {
    type Target;

    fn observe(&self, target: &Self::Target);
    fn unobserve(&self, target: &Self::Target);
}

/// Something that can carry the active marker class.
pub trait ActiveMarker {
    fn set_marked(&self, class: &str, on: bool);
}

impl ActiveMarker for web_sys::Element {
    fn set_marked(&self, class: &str, on: bool) {
        let list = self.class_list();
        let res = if on { list.add_1(class) } else { list.remove_1(class) };
        if res.is_err() {
            log::debug!("could not toggle class {class:?}");
        }
    }
}

/// Keeps the links of exactly one section marked.
#[derive(Debug)]
pub struct ActiveTracker<L> {
    links: NavLinks<L>,
    class: String,
    active: Option<String>,
}

impl<L: ActiveMarker> ActiveTracker<L> {
    pub fn new(links: NavLinks<L>, class: impl Into<String>) -> Self {
        Self {
            links,
            class: class.into(),
            active: None,
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Move the marker to `id`. Ids without links leave the current state alone.
    pub fn activate(&mut self, id: &str) {
        let Some(next) = self.links.get(id) else {
            return;
        };

        if let Some(prev) = self.active.as_deref().and_then(|p| self.links.get(p)) {
            for link in prev {
                link.set_marked(&self.class, false);
            }
        }
        for link in next {
            link.set_marked(&self.class, true);
        }
        self.active = Some(id.to_string());
    }

    /// Apply one notifier batch in reported order; the last intersecting entry wins.
    pub fn apply_batch(&mut self, changes: &[VisibilityChange]) {
        for change in changes.iter().filter(|c| c.intersecting) {
            self.activate(&change.id);
        }
    }
}

/// `rootMargin` for the activation band just below the header.
pub fn root_margin(offset: f64, config: &TocConfig) -> String {
    let top = offset + config.spy_top_margin;
    format!("-{top}px 0px -{}% 0px", config.spy_bottom_percent)
}

/// Scrollspy over a set of sections.
pub struct Scrollspy<N: VisibilityNotifier, L> {
    notifier: N,
    targets: Vec<N::Target>,
    tracker: Rc<RefCell<ActiveTracker<L>>>,
}

impl<N, L> Scrollspy<N, L>
where
    N: VisibilityNotifier,
    N::Target: Clone,
    L: ActiveMarker,
{
    /// Pre-mark the first section and start observing every heading.
    ///
    /// `tracker` must be the same one the notifier's callback feeds.
    pub fn start(
        sections: &[Section<N::Target>],
        tracker: Rc<RefCell<ActiveTracker<L>>>,
        notifier: N,
    ) -> Self {
        if let Some(first) = sections.first() {
            tracker.borrow_mut().activate(&first.id);
        }

        let targets: Vec<N::Target> = sections.iter().map(|s| s.heading.clone()).collect();
        for target in &targets {
            notifier.observe(target);
        }

        Self {
            notifier,
            targets,
            tracker,
        }
    }

    pub fn active(&self) -> Option<String> {
        self.tracker.borrow().active().map(str::to_string)
    }

    pub fn stop(self) {
        for target in &self.targets {
            self.notifier.unobserve(target);
        }
    }
}

/// [`VisibilityNotifier`] backed by `IntersectionObserver`.
///
/// Reports use the observed element's `id`, which the collector guarantees.
pub struct IntersectionNotifier {
    observer: web_sys::IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, web_sys::IntersectionObserver)>,
}

impl IntersectionNotifier {
    pub fn new(root_margin: &str, on_batch: impl Fn(&[VisibilityChange]) + 'static) -> Result<Self> {
        let callback = Closure::<dyn FnMut(js_sys::Array, web_sys::IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: web_sys::IntersectionObserver| {
                let changes: Vec<VisibilityChange> = entries
                    .iter()
                    .filter_map(|v| v.dyn_into::<web_sys::IntersectionObserverEntry>().ok())
                    .map(|entry| VisibilityChange {
                        id: entry.target().id(),
                        intersecting: entry.is_intersecting(),
                    })
                    .collect();
                on_batch(&changes);
            },
        );

        let init = web_sys::IntersectionObserverInit::new();
        init.set_root_margin(root_margin);
        let observer =
            web_sys::IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl VisibilityNotifier for IntersectionNotifier {
    type Target = web_sys::Element;

    fn observe(&self, target: &web_sys::Element) {
        self.observer.observe(target);
    }

    fn unobserve(&self, target: &web_sys::Element) {
        self.observer.unobserve(target);
    }
}

impl Drop for IntersectionNotifier {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Wire a browser scrollspy: tracker, `IntersectionObserver` and first-section default.
pub fn start_browser_spy(
    sections: &[Section<web_sys::Element>],
    links: NavLinks<web_sys::Element>,
    offset: f64,
    config: &TocConfig,
) -> Result<Scrollspy<IntersectionNotifier, web_sys::Element>> {
    let tracker = Rc::new(RefCell::new(ActiveTracker::new(links, config.active_class.clone())));

    let sink = Rc::clone(&tracker);
    let margin = root_margin(offset, config);
    let notifier = IntersectionNotifier::new(&margin, move |changes| {
        sink.borrow_mut().apply_batch(changes);
    })?;
    log::debug!("scrollspy band rootMargin={margin}");

    Ok(Scrollspy::start(sections, tracker, notifier))
}
