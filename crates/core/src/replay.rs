use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{
    dom::{Listener, Page, WeakPage},
    endpoints::Endpoints,
    session::SessionIdentity,
    tasks::InFlight,
    transport::Transport,
    types::DomEvent,
};

/// Fetches what the collector recorded for this session and renders the raw
/// body into the output region.
pub struct ReplayTrigger {
    session: Arc<dyn SessionIdentity>,
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
    page: WeakPage,
    output_region: String,
    runtime: Handle,
    in_flight: InFlight,
}

impl ReplayTrigger {
    pub fn new(
        session: Arc<dyn SessionIdentity>,
        transport: Arc<dyn Transport>,
        endpoints: Endpoints,
        page: Page,
        output_region: impl Into<String>,
        runtime: Handle,
        in_flight: InFlight,
    ) -> Self {
        Self {
            session,
            transport,
            endpoints,
            page: page.downgrade(),
            output_region: output_region.into(),
            runtime,
            in_flight,
        }
    }

    /// Always suppresses the default action of the triggering click.
    pub fn replay_session(&self, _event: &DomEvent) -> bool {
        let sid = self.session.get_or_create();
        let url = match self.endpoints.replay(&sid) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(sid = %sid, error = %e, "replay url not buildable");
                return false;
            }
        };

        let transport = Arc::clone(&self.transport);
        let page = self.page.clone();
        let region = self.output_region.clone();
        self.in_flight.spawn(&self.runtime, async move {
            match transport.get(url).await {
                Ok(response) if response.is_success() => {
                    let Some(page) = page.upgrade() else {
                        return;
                    };
                    let bytes = response.body.len();
                    if page.set_html(&region, response.body) {
                        tracing::debug!(sid = %sid, region = %region, bytes, "replay rendered");
                    }
                }
                Ok(response) => {
                    tracing::debug!(sid = %sid, status = response.status, "replay not rendered")
                }
                Err(e) => tracing::debug!(sid = %sid, error = %e, "replay request failed"),
            }
        });

        false
    }
}

impl Listener for ReplayTrigger {
    fn on_event(&self, event: &DomEvent) -> bool {
        self.replay_session(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        session::{FixedSession, SessionId},
        transport::RecordingTransport,
        types::EventKind,
    };

    fn trigger(transport: Arc<RecordingTransport>, page: &Page, in_flight: &InFlight) -> ReplayTrigger {
        ReplayTrigger::new(
            Arc::new(FixedSession::new(SessionId::new("R"))),
            transport,
            Endpoints::parse("http://localhost:8080").unwrap(),
            page.clone(),
            "#data",
            Handle::current(),
            in_flight.clone(),
        )
    }

    #[tokio::test]
    async fn successful_replay_replaces_output_region() {
        let page = Page::new();
        page.add_element("#data", "<p>previous</p>");
        let transport = RecordingTransport::ok("<div>...</div>");
        let in_flight = InFlight::new();
        let trigger = trigger(Arc::clone(&transport), &page, &in_flight);

        let proceed = trigger.replay_session(&DomEvent::new(EventKind::Click, 0.0, 0.0, 0.0));
        in_flight.wait_idle().await;

        assert!(!proceed);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].as_str(), "http://localhost:8080/events/R");
        assert_eq!(page.html("#data").as_deref(), Some("<div>...</div>"));
    }

    #[tokio::test]
    async fn error_status_leaves_output_untouched() {
        let page = Page::new();
        page.add_element("#data", "<p>previous</p>");
        let transport = RecordingTransport::with_status(500, "boom");
        let in_flight = InFlight::new();
        let trigger = trigger(Arc::clone(&transport), &page, &in_flight);

        assert!(!trigger.replay_session(&DomEvent::new(EventKind::Click, 0.0, 0.0, 0.0)));
        in_flight.wait_idle().await;

        assert_eq!(page.html("#data").as_deref(), Some("<p>previous</p>"));
    }

    #[tokio::test]
    async fn network_failure_leaves_output_untouched() {
        let page = Page::new();
        page.add_element("#data", "");
        let transport = RecordingTransport::failing();
        let in_flight = InFlight::new();
        let trigger = trigger(Arc::clone(&transport), &page, &in_flight);

        assert!(!trigger.replay_session(&DomEvent::new(EventKind::Click, 0.0, 0.0, 0.0)));
        in_flight.wait_idle().await;

        assert_eq!(transport.requests().len(), 1);
        assert_eq!(page.html("#data").as_deref(), Some(""));
    }
}
