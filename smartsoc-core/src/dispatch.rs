//! Fan-out of new records to independent display sinks.
//!
//! Every sink call is isolated: an error is logged and swallowed, a panic is
//! caught and logged, and the remaining sinks still run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{trace, warn};

use crate::error::SinkError;
use crate::incident::Incident;
use crate::stats::DashboardSnapshot;
use crate::types::EventRecord;

/// A display updater registered with the dispatcher.
///
/// Only `on_event` is required. Sinks cannot feed anything back into the
/// simulation; their results are used for logging only.
pub trait EventSink: Send {
    /// Registration key. Registering a second sink with the same name replaces
    /// the first.
    fn name(&self) -> &str;

    /// A new record was generated.
    fn on_event(&mut self, record: &EventRecord) -> Result<(), SinkError>;

    /// An incident was derived from a High or Critical record.
    fn on_incident(&mut self, _incident: &Incident) -> Result<(), SinkError> {
        Ok(())
    }

    /// A record reached a terminal status.
    fn on_status_change(&mut self, _record: &EventRecord) -> Result<(), SinkError> {
        Ok(())
    }

    /// Periodic dashboard refresh.
    fn on_snapshot(&mut self, _snapshot: &DashboardSnapshot) -> Result<(), SinkError> {
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one sink callback, containing errors and panics. Returns `true` when
/// the callback completed successfully.
pub(crate) fn isolate<F>(sink: &str, hook: &'static str, call: F) -> bool
where
    F: FnOnce() -> Result<(), SinkError>,
{
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => true,
        Ok(Err(SinkError::Detached)) => {
            trace!(sink, hook, "Sink target not attached");
            false
        }
        Ok(Err(e)) => {
            warn!(sink, hook, error = %e, "Sink failed");
            false
        }
        Err(payload) => {
            warn!(sink, hook, panic = %panic_message(payload.as_ref()), "Sink panicked");
            false
        }
    }
}

/// Ordered list of registered sinks.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink, returning the one it replaced.
    pub fn register(&mut self, sink: Box<dyn EventSink>) -> Option<Box<dyn EventSink>> {
        if let Some(slot) = self.sinks.iter_mut().find(|s| s.name() == sink.name()) {
            return Some(std::mem::replace(slot, sink));
        }
        self.sinks.push(sink);
        None
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn EventSink>> {
        let idx = self.sinks.iter().position(|s| s.name() == name)?;
        Some(self.sinks.remove(idx))
    }

    pub fn names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver a new record to every sink. Returns how many calls failed.
    pub fn publish_event(&mut self, record: &EventRecord) -> usize {
        self.each("on_event", |sink| sink.on_event(record))
    }

    pub fn publish_incident(&mut self, incident: &Incident) -> usize {
        self.each("on_incident", |sink| sink.on_incident(incident))
    }

    pub fn publish_status_change(&mut self, record: &EventRecord) -> usize {
        self.each("on_status_change", |sink| sink.on_status_change(record))
    }

    pub fn publish_snapshot(&mut self, snapshot: &DashboardSnapshot) -> usize {
        self.each("on_snapshot", |sink| sink.on_snapshot(snapshot))
    }

    fn each<F>(&mut self, hook: &'static str, mut call: F) -> usize
    where
        F: FnMut(&mut dyn EventSink) -> Result<(), SinkError>,
    {
        let mut failures = 0;
        for sink in self.sinks.iter_mut() {
            let name = sink.name().to_string();
            if !isolate(&name, hook, || call(sink.as_mut())) {
                failures += 1;
            }
        }
        failures
    }
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut").field("sinks", &self.names()).finish()
    }
}
