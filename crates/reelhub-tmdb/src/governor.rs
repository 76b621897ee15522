//! Sliding-window request governor.
//!
//! Bounds outbound TMDB calls to at most `max_requests` within any
//! trailing `window`. Callers that would exceed the bound are suspended
//! until the oldest in-window request ages out; nothing is ever dropped.
//!
//! The window is process-global per client instance and mutated only
//! between await points behind a tokio mutex. Running multiple server
//! instances multiplies the effective limit - a documented deployment
//! limitation, not something this layer papers over.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Timestamps of recent outbound requests, pruned to the window on every
/// check. Length never knowingly exceeds `max_requests` without a wait.
#[derive(Debug)]
pub(crate) struct SlidingWindow {
    max_requests: usize,
    window: Duration,
    timestamps: VecDeque<Instant>,
}

impl SlidingWindow {
    pub(crate) fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            timestamps: VecDeque::with_capacity(max_requests),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.duration_since(oldest) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Try to claim a slot at `now`. Returns `Ok(())` when the call may
    /// proceed immediately, or `Err(wait)` with the time until the oldest
    /// in-window request ages out.
    pub(crate) fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        self.prune(now);
        if self.timestamps.len() < self.max_requests {
            self.timestamps.push_back(now);
            Ok(())
        } else {
            // len == max_requests >= 1, so the front exists
            let wait = match self.timestamps.front() {
                Some(&oldest) => self.window - now.duration_since(oldest),
                None => Duration::ZERO,
            };
            Err(wait)
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.timestamps.len()
    }
}

/// Suspend until the window has capacity, then record the call.
pub(crate) async fn acquire(window: &tokio::sync::Mutex<SlidingWindow>) {
    loop {
        let wait = {
            let mut guard = window.lock().await;
            match guard.try_acquire(Instant::now()) {
                Ok(()) => return,
                Err(wait) => wait,
            }
        };
        tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting");
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn window_admits_up_to_max() {
        let mut w = SlidingWindow::new(3, Duration::from_secs(10));
        let now = Instant::now();
        assert!(w.try_acquire(now).is_ok());
        assert!(w.try_acquire(now).is_ok());
        assert!(w.try_acquire(now).is_ok());
        let wait = w.try_acquire(now).unwrap_err();
        assert_eq!(wait, Duration::from_secs(10));
        assert_eq!(w.in_flight(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pruning_frees_slots_after_window() {
        let mut w = SlidingWindow::new(2, Duration::from_secs(10));
        let start = Instant::now();
        assert!(w.try_acquire(start).is_ok());
        assert!(w.try_acquire(start).is_ok());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(w.try_acquire(Instant::now()).is_ok());
        assert_eq!(w.in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_delays_calls_beyond_max() {
        let window = Mutex::new(SlidingWindow::new(3, Duration::from_secs(10)));
        let start = Instant::now();

        for _ in 0..3 {
            acquire(&window).await;
        }
        // First three acquire immediately
        assert_eq!(Instant::now() - start, Duration::ZERO);

        // Fourth must wait for the oldest to age out
        acquire(&window).await;
        assert!(Instant::now() - start >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn no_rolling_window_exceeds_max() {
        let window = Mutex::new(SlidingWindow::new(2, Duration::from_secs(5)));
        let mut admitted: Vec<Instant> = Vec::new();

        for _ in 0..6 {
            acquire(&window).await;
            admitted.push(Instant::now());
        }

        // Count admissions in every trailing 5s span: never more than 2.
        for (i, &t) in admitted.iter().enumerate() {
            let in_window = admitted[..=i]
                .iter()
                .filter(|&&earlier| t.duration_since(earlier) < Duration::from_secs(5))
                .count();
            assert!(in_window <= 2, "window exceeded at admission {i}");
        }
    }
}
