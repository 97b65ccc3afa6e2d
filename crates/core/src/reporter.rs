use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{
    dom::Listener,
    endpoints::Endpoints,
    session::SessionIdentity,
    tasks::InFlight,
    transport::Transport,
    types::{DomEvent, TrackedEvent},
};

/// Forwards every event it is bound to as one fire-and-forget GET.
pub struct EventReporter {
    session: Arc<dyn SessionIdentity>,
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
    runtime: Handle,
    in_flight: InFlight,
}

impl EventReporter {
    pub fn new(
        session: Arc<dyn SessionIdentity>,
        transport: Arc<dyn Transport>,
        endpoints: Endpoints,
        runtime: Handle,
        in_flight: InFlight,
    ) -> Self {
        Self {
            session,
            transport,
            endpoints,
            runtime,
            in_flight,
        }
    }

    /// Always lets the default action proceed.
    pub fn report_event(&self, event: &DomEvent) -> bool {
        let record = TrackedEvent::from(event);
        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(kind = %record.kind, error = %e, "event not serializable, dropped");
                return true;
            }
        };

        let sid = self.session.get_or_create();
        let url = match self.endpoints.report(&sid, &json) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(kind = %record.kind, error = %e, "report url not buildable, dropped");
                return true;
            }
        };

        let transport = Arc::clone(&self.transport);
        self.in_flight.spawn(&self.runtime, async move {
            // response ignored; failures are only visible at debug level
            match transport.get(url).await {
                Ok(response) => {
                    tracing::debug!(status = response.status, kind = %record.kind, "event reported")
                }
                Err(e) => tracing::debug!(error = %e, kind = %record.kind, "event report failed"),
            }
        });

        true
    }
}

impl Listener for EventReporter {
    fn on_event(&self, event: &DomEvent) -> bool {
        self.report_event(event)
    }
}
