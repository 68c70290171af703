//! In-process analytics sink.
//!
//! One instance is built at startup and shared through the use cases; events
//! go to `tracing` and into a small ring buffer for inspection.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

const MAX_EVENTS: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub event: String,
    pub properties: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
pub struct Analytics {
    events: Mutex<VecDeque<AnalyticsEvent>>,
}

impl Analytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, event: &str, properties: Map<String, Value>) {
        let rendered = Value::Object(properties.clone()).to_string();
        tracing::info!(event, properties = %rendered, "Analytics event");

        let Ok(mut events) = self.events.lock() else {
            return;
        };
        if events.len() == MAX_EVENTS {
            events.pop_front();
        }
        events.push_back(AnalyticsEvent {
            event: event.to_string(),
            properties,
            timestamp: Utc::now(),
        });
    }

    pub fn track_user_action(&self, action: &str, properties: Map<String, Value>) {
        let mut props = properties;
        props.insert("action".into(), Value::String(action.to_string()));
        self.track("user_action", props);
    }

    pub fn track_business_event(&self, event: &str, properties: Map<String, Value>) {
        let mut props = properties;
        props.insert("event".into(), Value::String(event.to_string()));
        self.track("business_event", props);
    }

    /// Most recent events, oldest first.
    pub fn recent(&self) -> Vec<AnalyticsEvent> {
        self.events
            .lock()
            .map(|events| events.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Build a property map from `key => value` pairs.
#[macro_export]
macro_rules! props {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = ::serde_json::Map::new();
        $( map.insert($key.to_string(), ::serde_json::json!($value)); )*
        map
    }};
}
