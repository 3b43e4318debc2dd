//! Wait policy between side effects the controller does not acknowledge.
//!
//! Legacy defaults are fixed delays: nothing confirms that a clear or a probe
//! command actually finished, the flow just waits long enough.

use std::time::Duration;

/// How to wait for the address probe's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeWait {
    /// Sleep unconditionally, then read the buffer once.
    Fixed(Duration),
    /// Re-read the buffer every `interval` until the sentinel shows up or
    /// `timeout` elapses.
    Poll { timeout: Duration, interval: Duration },
}

impl ProbeWait {
    pub fn budget(&self) -> Duration {
        match *self {
            ProbeWait::Fixed(d) => d,
            ProbeWait::Poll { timeout, .. } => timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After each scrollback clear.
    pub clear_settle: Duration,
    pub probe_wait: ProbeWait,
    /// Between panes while broadcasting environment variables.
    pub broadcast_gap: Duration,
}

impl Pacing {
    pub const DEFAULT_CLEAR_SETTLE: Duration = Duration::from_millis(500);
    pub const DEFAULT_PROBE_WAIT: Duration = Duration::from_millis(4000);
    pub const DEFAULT_BROADCAST_GAP: Duration = Duration::from_millis(100);

    /// No waiting at all. For fakes that apply side effects synchronously.
    pub const fn immediate() -> Self {
        Self {
            clear_settle: Duration::ZERO,
            probe_wait: ProbeWait::Fixed(Duration::ZERO),
            broadcast_gap: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            clear_settle: Self::DEFAULT_CLEAR_SETTLE,
            probe_wait: ProbeWait::Fixed(Self::DEFAULT_PROBE_WAIT),
            broadcast_gap: Self::DEFAULT_BROADCAST_GAP,
        }
    }
}

/// Sleep for `d`, skipping the timer entirely for a zero duration.
pub(crate) async fn settle(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_legacy_delays() {
        let p = Pacing::default();
        assert_eq!(p.clear_settle, Duration::from_millis(500));
        assert_eq!(p.probe_wait, ProbeWait::Fixed(Duration::from_secs(4)));
        assert_eq!(p.broadcast_gap, Duration::from_millis(100));
    }

    #[test]
    fn immediate_has_no_delays() {
        let p = Pacing::immediate();
        assert!(p.clear_settle.is_zero());
        assert!(p.broadcast_gap.is_zero());
        assert!(p.probe_wait.budget().is_zero());
    }

    #[test]
    fn poll_budget_is_timeout() {
        let w = ProbeWait::Poll {
            timeout: Duration::from_secs(2),
            interval: Duration::from_millis(250),
        };
        assert_eq!(w.budget(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn settle_waits_for_duration() {
        let start = tokio::time::Instant::now();
        settle(Duration::from_millis(500)).await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
