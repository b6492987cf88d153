//! In-memory event capture.
//!
//! [`CaptureLayer`] is a `tracing_subscriber` layer that copies every event it
//! sees into a shared [`CapturedEvents`] buffer. Tests install it for the
//! current thread with `tracing::subscriber::set_default` and assert on the
//! recorded level, message and fields afterwards.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// One recorded event.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedEvent {
    /// Level name (`"INFO"`, `"WARN"`, ...).
    pub level: String,
    /// Module path that emitted the event.
    pub target: String,
    /// The event's `message` field, empty when absent.
    pub message: String,
    /// Every other field, as JSON values.
    pub fields: HashMap<String, serde_json::Value>,
}

impl CapturedEvent {
    /// `true` if this event was logged at `level`.
    pub fn is_level(&self, level: Level) -> bool {
        self.level == level.as_str()
    }
}

/// Shared buffer of captured events. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct CapturedEvents {
    events: Arc<RwLock<Vec<CapturedEvent>>>,
}

impl CapturedEvents {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.read().map(|events| events.clone()).unwrap_or_default()
    }

    /// Events at `level` whose message contains `needle`.
    pub fn matching(&self, level: Level, needle: &str) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| e.is_level(level) && e.message.contains(needle)).collect()
    }

    /// `true` if any event at `level` contains `needle` in its message.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        !self.matching(level, needle).is_empty()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }

    fn push(&self, event: CapturedEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }
}

/// A tracing layer that records events into a [`CapturedEvents`] buffer.
///
/// # Example
///
/// ```rust,ignore
/// use tracing_subscriber::layer::SubscriberExt;
/// use docqa_telemetry::{CaptureLayer, CapturedEvents};
///
/// let events = CapturedEvents::new();
/// let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(events.clone()));
/// let _guard = tracing::subscriber::set_default(subscriber);
/// ```
pub struct CaptureLayer {
    events: CapturedEvents,
}

impl CaptureLayer {
    /// Create a layer writing into `events`.
    pub fn new(events: CapturedEvents) -> Self {
        Self { events }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.0;

        let message = match fields.remove("message") {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let metadata = event.metadata();
        self.events.push(CapturedEvent {
            level: metadata.level().as_str().to_string(),
            target: metadata.target().to_string(),
            message,
            fields,
        });
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    #[test]
    fn test_captures_level_message_and_fields() {
        let events = CapturedEvents::new();
        let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(events.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(client = "acme", row = 2u64, "question row skipped");
            tracing::info!(ok = true, "done");
        });

        let recorded = events.events();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].level, "WARN");
        assert_eq!(recorded[0].message, "question row skipped");
        assert_eq!(recorded[0].fields["client"], "acme");
        assert_eq!(recorded[0].fields["row"], 2);
        assert_eq!(recorded[1].fields["ok"], true);
        assert!(events.contains(Level::WARN, "skipped"));
        assert!(!events.contains(Level::ERROR, "skipped"));
    }

    #[test]
    fn test_clear_empties_buffer() {
        let events = CapturedEvents::new();
        let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(events.clone()));
        tracing::subscriber::with_default(subscriber, || tracing::info!("one"));
        events.clear();
        assert!(events.events().is_empty());
    }
}
