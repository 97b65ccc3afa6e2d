use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};
use clicktrail_core::{DomEvent, EventKind, Page};
use serde::Deserialize;

/// One JSON line of `track` input. Anything besides these fields is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputEvent {
    #[serde(rename = "type")]
    kind: EventKind,
    client_x: f64,
    client_y: f64,
    time_stamp: Option<f64>,
    #[serde(default)]
    button: Option<u8>,
    #[serde(default)]
    shift_key: bool,
    #[serde(default)]
    ctrl_key: bool,
    #[serde(default)]
    alt_key: bool,
    #[serde(default)]
    meta_key: bool,
}

impl InputEvent {
    fn into_dom(self, time_stamp: f64) -> DomEvent {
        DomEvent {
            button: self.button,
            shift_key: self.shift_key,
            ctrl_key: self.ctrl_key,
            alt_key: self.alt_key,
            meta_key: self.meta_key,
            ..DomEvent::new(self.kind, self.client_x, self.client_y, time_stamp)
        }
    }
}

/// Opens `path`, or stdin when it is absent or `-`.
pub fn open(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Parses JSON-lines pointer events. Events without a `timeStamp` are stamped
/// with the page's time since load as they are read.
pub fn read_events(reader: impl BufRead, page: &Page) -> Result<Vec<DomEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let input: InputEvent = serde_json::from_str(line)
            .with_context(|| format!("line {}: not a pointer event", idx + 1))?;
        let time_stamp = input.time_stamp.unwrap_or_else(|| page.since_load_ms());
        events.push(input.into_dom(time_stamp));
    }
    Ok(events)
}
