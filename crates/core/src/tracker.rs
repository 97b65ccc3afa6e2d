use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{
    config::TrackerConfig,
    dom::Page,
    error::{Result, TrackerError},
    replay::ReplayTrigger,
    reporter::EventReporter,
    session::{CookieSession, SessionIdentity},
    tasks::InFlight,
    transport::Transport,
    types::EventKind,
};

/// The wiring of a reporter and a replay trigger onto one page.
pub struct Tracker {
    page: Page,
    config: TrackerConfig,
    session: Arc<dyn SessionIdentity>,
    in_flight: InFlight,
}

impl Tracker {
    /// Page-load path: writes a fresh session cookie on the page, then installs.
    pub fn load(page: Page, config: TrackerConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let session = CookieSession::start(page.cookies().clone(), config.cookie_key.clone());
        Self::install(page, config, Arc::new(session), transport)
    }

    pub fn install(
        page: Page,
        config: TrackerConfig,
        session: Arc<dyn SessionIdentity>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;
        for selector in [
            &config.tracked_region,
            &config.replay_control,
            &config.output_region,
        ] {
            if !page.has_element(selector) {
                return Err(TrackerError::MissingRegion {
                    selector: selector.clone(),
                });
            }
        }

        let runtime = Handle::try_current().map_err(|_| TrackerError::NoRuntime)?;
        let endpoints = config.endpoints()?;
        let in_flight = InFlight::new();

        let reporter = Arc::new(EventReporter::new(
            Arc::clone(&session),
            Arc::clone(&transport),
            endpoints.clone(),
            runtime.clone(),
            in_flight.clone(),
        ));
        for kind in &config.tracked_events {
            tracing::info!("Adding listener for {} events", kind);
            page.bind(&config.tracked_region, *kind, reporter.clone());
        }

        let replay = Arc::new(ReplayTrigger::new(
            Arc::clone(&session),
            transport,
            endpoints,
            page.clone(),
            config.output_region.clone(),
            runtime,
            in_flight.clone(),
        ));
        page.bind(&config.replay_control, EventKind::Click, replay);

        Ok(Self {
            page,
            config,
            session,
            in_flight,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<dyn SessionIdentity> {
        &self.session
    }

    /// A pointer event on the tracked region. Returns the default-action flag.
    pub fn pointer(&self, kind: EventKind, client_x: f64, client_y: f64) -> bool {
        let event = self.page.pointer(kind, client_x, client_y);
        self.page.dispatch(&self.config.tracked_region, &event)
    }

    /// A click on the replay control. Returns the default-action flag.
    pub fn click_replay(&self) -> bool {
        let event = self.page.pointer(EventKind::Click, 0.0, 0.0);
        self.page.dispatch(&self.config.replay_control, &event)
    }

    pub fn output(&self) -> String {
        self.page
            .html(&self.config.output_region)
            .unwrap_or_default()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Requests issued since install, including ones that already completed.
    pub fn requests_sent(&self) -> usize {
        self.in_flight.spawned_total()
    }

    /// Waits until every request spawned so far has finished.
    pub async fn settle(&self) {
        self.in_flight.wait_idle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;

    fn stock_page() -> Page {
        Page::with_regions(["#canvas", "#replay", "#data"])
    }

    #[tokio::test]
    async fn install_binds_each_tracked_kind_once_and_replay_on_click() {
        let page = stock_page();
        let _tracker =
            Tracker::load(page.clone(), TrackerConfig::default(), RecordingTransport::ok(""))
                .unwrap();

        assert_eq!(page.listener_count("#canvas", EventKind::Click), 1);
        assert_eq!(page.listener_count("#canvas", EventKind::MouseMove), 1);
        assert_eq!(page.listener_count("#canvas", EventKind::MouseDown), 0);
        assert_eq!(page.listener_count("#replay", EventKind::Click), 1);
    }

    #[tokio::test]
    async fn load_writes_session_cookie() {
        let page = stock_page();
        let tracker =
            Tracker::load(page.clone(), TrackerConfig::default(), RecordingTransport::ok(""))
                .unwrap();

        let sid = tracker.session().current().unwrap();
        assert_eq!(page.cookies().get("sid"), Some(sid.to_string()));
    }

    #[tokio::test]
    async fn install_requires_every_region() {
        let page = Page::with_regions(["#canvas", "#replay"]);
        let err = Tracker::load(page, TrackerConfig::default(), RecordingTransport::ok(""))
            .err()
            .unwrap();
        assert!(matches!(err, TrackerError::MissingRegion { selector } if selector == "#data"));
    }

    #[test]
    fn install_outside_runtime_is_an_error() {
        let err = Tracker::load(stock_page(), TrackerConfig::default(), RecordingTransport::ok(""))
            .err()
            .unwrap();
        assert!(matches!(err, TrackerError::NoRuntime));
    }

    #[tokio::test]
    async fn requests_sent_includes_completed_requests() {
        let tracker =
            Tracker::load(stock_page(), TrackerConfig::default(), RecordingTransport::ok(""))
                .unwrap();
        assert_eq!(tracker.requests_sent(), 0);

        tracker.pointer(EventKind::MouseMove, 1.0, 2.0);
        tracker.pointer(EventKind::Click, 3.0, 4.0);
        tracker.settle().await;
        assert_eq!(tracker.in_flight(), 0);
        assert_eq!(tracker.requests_sent(), 2);

        tracker.pointer(EventKind::MouseDown, 5.0, 6.0);
        tracker.click_replay();
        tracker.settle().await;
        assert_eq!(tracker.requests_sent(), 3);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_binding() {
        let page = stock_page();
        let config = TrackerConfig {
            tracked_events: Vec::new(),
            ..TrackerConfig::default()
        };

        assert!(Tracker::load(page.clone(), config, RecordingTransport::ok("")).is_err());
        assert_eq!(page.listener_count("#replay", EventKind::Click), 0);
    }
}
