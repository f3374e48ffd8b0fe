#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A small trace event recorded while an agent thinks.
///
/// This is plain data so it can be captured during simulation and inspected later by tests or
/// tooling. `action` names the catalog action involved, if any; `value` is a tag-specific number
/// (plan length, catalog index, expansion count).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub tag: Cow<'static, str>,
    pub action: Option<Cow<'static, str>>,
    pub value: u64,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            tag: tag.into(),
            action: None,
            value: 0,
        }
    }

    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn count(&self, tag: &str) -> usize {
        self.events.iter().filter(|e| e.tag == tag).count()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.tag.as_ref())
    }
}

/// Fan-out point owned by whoever produces events: an optional in-memory log plus an optional
/// user sink. With neither installed, `emit` is a no-op.
#[derive(Default)]
pub struct Tracer {
    log: Option<TraceLog>,
    sink: Option<Box<dyn TraceSink>>,
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_log(&mut self) {
        self.log.get_or_insert_with(TraceLog::default);
    }

    pub fn set_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    pub fn log(&self) -> Option<&TraceLog> {
        self.log.as_ref()
    }

    pub fn take_log(&mut self) -> Option<TraceLog> {
        self.log.as_mut().map(std::mem::take)
    }

    pub fn is_enabled(&self) -> bool {
        self.log.is_some() || self.sink.is_some()
    }

    pub fn emit(&mut self, event: TraceEvent) {
        match (self.log.as_mut(), self.sink.as_mut()) {
            (Some(log), Some(sink)) => {
                log.push(event.clone());
                sink.emit(event);
            }
            (Some(log), None) => log.push(event),
            (None, Some(sink)) => sink.emit(event),
            (None, None) => {}
        }
    }
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("log", &self.log)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
