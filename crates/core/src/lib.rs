pub mod config;
pub mod dom;
pub mod endpoints;
pub mod error;
pub mod replay;
pub mod reporter;
pub mod session;
pub mod tasks;
pub mod tracker;
pub mod transport;
pub mod types;

pub use config::TrackerConfig;
pub use dom::{Listener, Page};
pub use endpoints::Endpoints;
pub use error::{Result, TrackerError};
pub use replay::ReplayTrigger;
pub use reporter::EventReporter;
pub use session::{CookieJar, CookieSession, FixedSession, SessionId, SessionIdentity};
pub use tracker::Tracker;
pub use transport::{HttpResponse, HttpTransport, RecordingTransport, Transport};
pub use types::{DomEvent, EventKind, TrackedEvent};
