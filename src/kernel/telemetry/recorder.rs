use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::event::AgentEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};

const MAX_EVENTS: usize = 10_000;

#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<AgentEvent>,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    pub fn record(&mut self, event: AgentEvent) {
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn events(&self) -> impl Iterator<Item = &AgentEvent> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Shared handle used by the controller, the recorder handle and upload tasks.
#[derive(Debug, Clone, Default)]
pub struct TelemetryHandle {
    inner: Arc<Mutex<TelemetryRecorder>>,
}

impl TelemetryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: AgentEvent) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    pub fn events(&self) -> Vec<AgentEvent> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events()
            .cloned()
            .collect()
    }
}
