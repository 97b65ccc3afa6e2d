use std::{collections::HashMap, sync::Arc};

use crate::types::{DomEvent, EventKind};

/// Something bound to a region for one event kind.
///
/// The return value is the DOM handler convention: `false` suppresses the
/// default action of the event.
pub trait Listener: Send + Sync + 'static {
    fn on_event(&self, event: &DomEvent) -> bool;
}

impl<F> Listener for F
where
    F: Fn(&DomEvent) -> bool + Send + Sync + 'static,
{
    fn on_event(&self, event: &DomEvent) -> bool {
        self(event)
    }
}

#[derive(Clone)]
pub struct Route {
    pub listener: Arc<dyn Listener>,
}

impl Route {
    pub fn new(listener: Arc<dyn Listener>) -> Self {
        Self { listener }
    }

    pub fn fire(&self, event: &DomEvent) -> bool {
        self.listener.on_event(event)
    }
}

#[derive(Default)]
pub struct Routes {
    pub table: HashMap<(String, EventKind), Vec<Route>>,
}

impl Routes {
    pub fn add(&mut self, selector: &str, kind: EventKind, listener: Arc<dyn Listener>) {
        self.table
            .entry((selector.to_string(), kind))
            .or_default()
            .push(Route::new(listener));
    }

    pub fn lookup(&self, selector: &str, kind: EventKind) -> Option<&[Route]> {
        self.table
            .get(&(selector.to_string(), kind))
            .map(Vec::as_slice)
    }

    pub fn count(&self, selector: &str, kind: EventKind) -> usize {
        self.lookup(selector, kind).map_or(0, <[Route]>::len)
    }
}
