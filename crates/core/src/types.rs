use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

/// Pointer event kinds a page can dispatch and a tracker can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    DblClick,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseOver,
    MouseOut,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Click,
        EventKind::DblClick,
        EventKind::MouseDown,
        EventKind::MouseUp,
        EventKind::MouseMove,
        EventKind::MouseOver,
        EventKind::MouseOut,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::DblClick => "dblclick",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::MouseMove => "mousemove",
            EventKind::MouseOver => "mouseover",
            EventKind::MouseOut => "mouseout",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// Writes whole numbers without a fraction, the way `JSON.stringify` does.
fn js_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// An event as the page dispatches it. Carries more than the tracker reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub client_x: f64,
    pub client_y: f64,
    #[serde(default)]
    pub time_stamp: f64,
    #[serde(default)]
    pub button: Option<u8>,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub meta_key: bool,
}

impl DomEvent {
    pub fn new(kind: EventKind, client_x: f64, client_y: f64, time_stamp: f64) -> Self {
        Self {
            kind,
            client_x,
            client_y,
            time_stamp,
            button: None,
            shift_key: false,
            ctrl_key: false,
            alt_key: false,
            meta_key: false,
        }
    }
}

/// The record sent to the collector. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(serialize_with = "js_number")]
    pub client_x: f64,
    #[serde(serialize_with = "js_number")]
    pub client_y: f64,
    #[serde(serialize_with = "js_number")]
    pub time_stamp: f64,
}

impl From<&DomEvent> for TrackedEvent {
    fn from(event: &DomEvent) -> Self {
        Self {
            kind: event.kind,
            client_x: event.client_x,
            client_y: event.client_y,
            time_stamp: event.time_stamp,
        }
    }
}
