//! Open long-lived connections, per kind.
//!
//! Each WebSocket or SSE stream holds a [`StreamGuard`] for its whole life.
//! Dropping the guard (loop exit, client disconnect, server drop of the
//! response stream) decrements the count and the open-streams gauge.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    WebSocket,
    Sse,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::WebSocket => "websocket",
            StreamKind::Sse => "sse",
        }
    }
}

#[derive(Debug, Default)]
pub struct ActiveStreams {
    websocket: AtomicUsize,
    sse: AtomicUsize,
}

impl ActiveStreams {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, kind: StreamKind) -> &AtomicUsize {
        match kind {
            StreamKind::WebSocket => &self.websocket,
            StreamKind::Sse => &self.sse,
        }
    }

    /// Register a new stream of `kind`.
    pub fn open(self: &Arc<Self>, kind: StreamKind) -> StreamGuard {
        self.counter(kind).fetch_add(1, Ordering::SeqCst);
        metrics::stream_opened(kind.as_str());
        tracing::debug!(kind = kind.as_str(), "Stream opened");
        StreamGuard {
            streams: self.clone(),
            kind,
            items: 0,
        }
    }

    /// Streams of `kind` still open.
    pub fn count(&self, kind: StreamKind) -> usize {
        self.counter(kind).load(Ordering::SeqCst)
    }
}

/// Held for the life of one stream.
#[derive(Debug)]
pub struct StreamGuard {
    streams: Arc<ActiveStreams>,
    kind: StreamKind,
    items: u64,
}

impl StreamGuard {
    /// Count one message or event sent on this stream.
    pub fn record_item(&mut self) {
        self.items += 1;
    }

    pub fn items(&self) -> u64 {
        self.items
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.streams.counter(self.kind).fetch_sub(1, Ordering::SeqCst);
        metrics::stream_closed(self.kind.as_str());
        tracing::debug!(kind = self.kind.as_str(), items = self.items, "Stream closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_track_open_streams_per_kind() {
        let streams = Arc::new(ActiveStreams::new());
        let first = streams.open(StreamKind::WebSocket);
        let second = streams.open(StreamKind::WebSocket);
        let sse = streams.open(StreamKind::Sse);
        assert_eq!(streams.count(StreamKind::WebSocket), 2);
        assert_eq!(streams.count(StreamKind::Sse), 1);

        drop(first);
        assert_eq!(streams.count(StreamKind::WebSocket), 1);
        drop(sse);
        assert_eq!(streams.count(StreamKind::Sse), 0);
        drop(second);
        assert_eq!(streams.count(StreamKind::WebSocket), 0);
    }

    #[test]
    fn items_are_counted_per_guard() {
        let streams = Arc::new(ActiveStreams::new());
        let mut guard = streams.open(StreamKind::Sse);
        guard.record_item();
        guard.record_item();
        assert_eq!(guard.items(), 2);
    }
}
