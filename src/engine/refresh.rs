use std::sync::mpsc::Sender;
use std::time::{Duration, SystemTime};

use super::interface::Event;

/// Tracks background refresh subscribers for the full report list.
///
/// There is one list, so one fetch serves every subscriber; the scheduler
/// only decides when that fetch is due and fans the result out.
pub struct RefreshScheduler {
    interval: Option<Duration>,
    subscribers: Vec<Sender<Event>>,
    // Wall clock: a monotonic clock stops during suspend and would delay the
    // first refresh after wake by the length of the sleep.
    last_fetch: Option<SystemTime>,
}

impl RefreshScheduler {
    /// An `interval` of zero disables background refresh.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: (!interval.is_zero()).then_some(interval),
            subscribers: Vec::new(),
            last_fetch: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval.is_some()
    }

    pub fn register(&mut self, notify_tx: Sender<Event>) {
        if self.interval.is_none() {
            tracing::debug!("refresh: disabled, ignoring subscriber");
            return;
        }
        self.subscribers.push(notify_tx);
    }

    /// Record that the full list was just fetched.
    pub fn mark_fetched(&mut self) {
        self.last_fetch = Some(SystemTime::now());
    }

    /// Whether a background fetch should run now.
    ///
    /// Never due before the first fetch: the initial load is done on demand
    /// by the view, background refresh only follows it.
    pub fn is_due(&self) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        if self.subscribers.is_empty() {
            return false;
        }
        self.last_fetch.is_some_and(|t| {
            SystemTime::now()
                .duration_since(t)
                .unwrap_or(Duration::ZERO)
                >= interval
        })
    }

    /// Send `event` to every subscriber, dropping those whose receiver is
    /// gone.
    pub fn broadcast(&mut self, event: &Event) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    fn probe_event() -> Event {
        Event::FetchError {
            context: "probe".to_owned(),
            message: String::new(),
        }
    }

    #[test]
    fn zero_interval_disables() {
        let (tx, _rx) = mpsc::channel();
        let mut s = RefreshScheduler::new(Duration::ZERO);
        s.register(tx);
        s.mark_fetched();
        assert!(!s.is_enabled());
        assert!(s.is_empty());
        assert!(!s.is_due());
    }

    #[test]
    fn not_due_before_first_fetch() {
        let (tx, _rx) = mpsc::channel();
        let mut s = RefreshScheduler::new(Duration::from_nanos(1));
        s.register(tx);
        assert!(!s.is_due());
        s.mark_fetched();
        std::thread::sleep(Duration::from_millis(2));
        assert!(s.is_due());
    }

    #[test]
    fn broadcast_prunes_closed_receivers() {
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel::<Event>();
        let mut s = RefreshScheduler::new(Duration::from_secs(60));
        s.register(tx_a);
        s.register(tx_b);
        drop(rx_b);
        s.broadcast(&probe_event());
        assert_eq!(s.len(), 1);
        assert!(rx_a.try_recv().is_ok());
    }
}
