//! Server-sent time stream.
//!
//! One event per tick, first one immediately. Axum drops the stream when
//! the client disconnects; the drop guard then logs and updates the gauge.
//! Nothing is buffered beyond the current event.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures_util::stream::{self, Stream};
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::http::server::AppState;
use crate::http::streams::{StreamGuard, StreamKind};

/// Text carried by every event.
pub fn event_data(now: chrono::DateTime<chrono::Local>) -> String {
    format!("The server time is {}", now.format("%H:%M:%S"))
}

/// Endless event stream ticking every `period`. `guard` lives as long as
/// the stream does.
pub fn time_events(
    period: Duration,
    guard: StreamGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let mut ticker: Interval = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    stream::unfold((ticker, guard), |(mut ticker, mut guard)| async move {
        ticker.tick().await;
        let event = Event::default()
            .id(guard.items().to_string())
            .data(event_data(chrono::Local::now()));
        guard.record_item();
        Some((Ok(event), (ticker, guard)))
    })
}

pub async fn sse(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let guard = state.streams.open(StreamKind::Sse);
    Sse::new(time_events(state.config.streaming.sse_interval(), guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use futures_util::StreamExt;
    use std::sync::Arc;

    use crate::http::streams::ActiveStreams;

    #[test]
    fn data_format() {
        let at = chrono::Local.with_ymd_and_hms(2024, 5, 1, 9, 8, 7).unwrap();
        assert_eq!(event_data(at), "The server time is 09:08:07");
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_the_configured_period() {
        let streams = Arc::new(ActiveStreams::new());
        let start = tokio::time::Instant::now();
        let events: Vec<_> = time_events(Duration::from_secs(1), streams.open(StreamKind::Sse))
            .take(3)
            .collect()
            .await;
        assert_eq!(events.len(), 3);
        // First event is immediate, then one per period.
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_stream_releases_it() {
        let streams = Arc::new(ActiveStreams::new());
        let guard = streams.open(StreamKind::Sse);
        let mut events = Box::pin(time_events(Duration::from_secs(1), guard));
        events.next().await;
        assert_eq!(streams.count(StreamKind::Sse), 1);
        drop(events);
        assert_eq!(streams.count(StreamKind::Sse), 0);
    }
}
