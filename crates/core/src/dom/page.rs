use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, RwLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use crate::{
    dom::{Listener, Route, Routes},
    session::CookieJar,
    types::{DomEvent, EventKind},
};

/// In-process stand-in for a loaded document: named regions with HTML
/// content, event bindings per region, and the page's cookie jar.
#[derive(Clone)]
pub struct Page {
    inner: Arc<PageInner>,
}

/// Handle that does not keep the page alive, for listeners the page owns.
#[derive(Clone)]
pub struct WeakPage(Weak<PageInner>);

impl WeakPage {
    pub fn upgrade(&self) -> Option<Page> {
        self.0.upgrade().map(|inner| Page { inner })
    }
}

struct PageInner {
    elements: Mutex<HashMap<String, String>>,
    routes: RwLock<Routes>,
    cookies: CookieJar,
    loaded_at: Instant,
    unrouted_total: AtomicU64,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PageInner {
                elements: Mutex::new(HashMap::new()),
                routes: RwLock::new(Routes::default()),
                cookies: CookieJar::new(),
                loaded_at: Instant::now(),
                unrouted_total: AtomicU64::new(0),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakPage {
        WeakPage(Arc::downgrade(&self.inner))
    }

    /// A page whose regions all start out empty.
    pub fn with_regions<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let page = Self::new();
        for selector in selectors {
            page.add_element(selector.as_ref(), "");
        }
        page
    }

    pub fn add_element(&self, selector: &str, html: &str) {
        self.inner
            .elements
            .lock()
            .expect("Page elements poisoned")
            .insert(selector.to_string(), html.to_string());
    }

    pub fn has_element(&self, selector: &str) -> bool {
        self.inner
            .elements
            .lock()
            .expect("Page elements poisoned")
            .contains_key(selector)
    }

    pub fn html(&self, selector: &str) -> Option<String> {
        self.inner
            .elements
            .lock()
            .expect("Page elements poisoned")
            .get(selector)
            .cloned()
    }

    /// Replaces the whole content of a region. Returns `false` if the region
    /// does not exist, in which case nothing happens.
    pub fn set_html(&self, selector: &str, html: String) -> bool {
        let mut elements = self.inner.elements.lock().expect("Page elements poisoned");
        match elements.get_mut(selector) {
            Some(content) => {
                *content = html;
                true
            }
            None => false,
        }
    }

    pub fn bind(&self, selector: &str, kind: EventKind, listener: Arc<dyn Listener>) {
        self.inner
            .routes
            .write()
            .expect("Page routes poisoned")
            .add(selector, kind, listener);
    }

    pub fn listener_count(&self, selector: &str, kind: EventKind) -> usize {
        self.inner
            .routes
            .read()
            .expect("Page routes poisoned")
            .count(selector, kind)
    }

    /// Runs every listener bound to `(selector, event.kind)` in bind order.
    ///
    /// Returns whether the default action should proceed: `false` as soon as
    /// any listener asked for suppression, `true` otherwise (including when
    /// nothing is bound).
    pub fn dispatch(&self, selector: &str, event: &DomEvent) -> bool {
        // listeners may touch the page, so never run them under the lock
        let routes: Vec<Route> = {
            let table = self.inner.routes.read().expect("Page routes poisoned");
            match table.lookup(selector, event.kind) {
                Some(routes) => routes.to_vec(),
                None => Vec::new(),
            }
        };

        if routes.is_empty() {
            self.inner.unrouted_total.fetch_add(1, Ordering::Relaxed);
            return true;
        }

        routes
            .iter()
            .fold(true, |proceed, route| route.fire(event) && proceed)
    }

    /// Builds a pointer event stamped with the time since this page loaded.
    pub fn pointer(&self, kind: EventKind, client_x: f64, client_y: f64) -> DomEvent {
        DomEvent::new(kind, client_x, client_y, self.since_load_ms())
    }

    pub fn since_load_ms(&self) -> f64 {
        self.inner.loaded_at.elapsed().as_secs_f64() * 1000.0
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.inner.cookies
    }

    pub fn unrouted_total(&self) -> u64 {
        self.inner.unrouted_total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn dispatch_runs_listeners_in_bind_order() {
        let page = Page::with_regions(["#canvas"]);
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            page.bind(
                "#canvas",
                EventKind::Click,
                Arc::new(move |_: &DomEvent| {
                    order.lock().unwrap().push(tag);
                    true
                }),
            );
        }

        assert!(page.dispatch("#canvas", &page.pointer(EventKind::Click, 0.0, 0.0)));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn any_false_listener_suppresses_default_but_all_still_run() {
        let page = Page::with_regions(["#replay"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        page.bind(
            "#replay",
            EventKind::Click,
            Arc::new(move |_: &DomEvent| {
                c.fetch_add(1, Ordering::SeqCst);
                false
            }),
        );
        let c = Arc::clone(&calls);
        page.bind(
            "#replay",
            EventKind::Click,
            Arc::new(move |_: &DomEvent| {
                c.fetch_add(1, Ordering::SeqCst);
                true
            }),
        );

        assert!(!page.dispatch("#replay", &page.pointer(EventKind::Click, 1.0, 1.0)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unbound_dispatch_proceeds_and_is_counted() {
        let page = Page::with_regions(["#canvas"]);
        page.bind("#canvas", EventKind::Click, Arc::new(|_: &DomEvent| false));

        assert!(page.dispatch("#canvas", &page.pointer(EventKind::MouseMove, 0.0, 0.0)));
        assert!(page.dispatch("#other", &page.pointer(EventKind::Click, 0.0, 0.0)));
        assert_eq!(page.unrouted_total(), 2);
    }

    #[test]
    fn listener_can_write_to_page_during_dispatch() {
        let page = Page::with_regions(["#canvas", "#data"]);
        let handle = page.clone();
        page.bind(
            "#canvas",
            EventKind::Click,
            Arc::new(move |e: &DomEvent| handle.set_html("#data", format!("{}", e.client_x))),
        );

        page.dispatch("#canvas", &DomEvent::new(EventKind::Click, 42.0, 0.0, 0.0));
        assert_eq!(page.html("#data").as_deref(), Some("42"));
    }

    #[test]
    fn set_html_replaces_content_and_ignores_missing_regions() {
        let page = Page::new();
        page.add_element("#data", "<p>old</p>");

        assert!(page.set_html("#data", "<div>new</div>".to_string()));
        assert_eq!(page.html("#data").as_deref(), Some("<div>new</div>"));
        assert!(!page.set_html("#missing", "x".to_string()));
        assert!(!page.has_element("#missing"));
    }
}
