//! Rotating status messages shown while a long job runs.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_ROTATION: Duration = Duration::from_secs(3);

/// Owns the task that rotates through status messages. The task is aborted
/// when the ticker is stopped or dropped, so it never outlives the job that
/// started it.
#[derive(Debug)]
pub struct StatusTicker {
    handle: Option<JoinHandle<()>>,
}

impl StatusTicker {
    /// Calls `on_message` with the first message immediately, then with the
    /// next one every `interval`, wrapping around. Must be called inside a
    /// tokio runtime.
    pub fn spawn<F>(messages: &'static [&'static str], interval: Duration, mut on_message: F) -> Self
    where
        F: FnMut(&'static str) + Send + 'static,
    {
        if messages.is_empty() {
            return Self { handle: None };
        }

        on_message(messages[0]);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            let mut index = 0;
            loop {
                ticker.tick().await;
                index = (index + 1) % messages.len();
                on_message(messages[index]);
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Status ticker stopped");
        }
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const MESSAGES: &[&str] = &["one", "two", "three"];

    #[tokio::test]
    async fn test_rotates_and_wraps() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut ticker = StatusTicker::spawn(MESSAGES, Duration::from_millis(5), move |m| {
            sink.lock().unwrap().push(m)
        });
        tokio::time::sleep(Duration::from_millis(60)).await;
        ticker.stop();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(&seen[..4], &["one", "two", "three", "one"]);
    }

    #[tokio::test]
    async fn test_drop_stops_rotation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let ticker = StatusTicker::spawn(MESSAGES, Duration::from_millis(5), move |m| {
            sink.lock().unwrap().push(m)
        });
        assert!(ticker.is_running());
        drop(ticker);

        let count = seen.lock().unwrap().len();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(seen.lock().unwrap().len(), count);
    }

    #[tokio::test]
    async fn test_empty_messages_spawn_nothing() {
        let ticker = StatusTicker::spawn(&[], Duration::from_millis(5), |_| {});
        assert!(!ticker.is_running());
    }
}
