// THEORY:
// The `throttle` module gates the audio feedback channel. Posture violations
// arrive at frame rate, but speaking every frame would be unbearable, so the
// throttle enforces a minimum quiet period between vocalizations. Alerts that
// fall inside the quiet period are dropped, never queued; the next violation
// after the period ends speaks fresh.

/// Minimum quiet period between vocalizations.
pub const SPEAK_INTERVAL_MS: u64 = 5_000;

/// Rate limiter for spoken feedback. Tracks a single "last spoken at"
/// timestamp, updated only when an alert actually fires.
#[derive(Debug, Clone)]
pub struct FeedbackThrottle {
    interval_ms: u64,
    last_spoken_ms: Option<u64>,
}

impl Default for FeedbackThrottle {
    fn default() -> Self {
        Self::new(SPEAK_INTERVAL_MS)
    }
}

impl FeedbackThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_spoken_ms: None,
        }
    }

    /// Decides whether to vocalize now. Only the first message of a batch is
    /// ever spoken; the rest remain on-screen feedback.
    pub fn maybe_speak(&mut self, messages: &[String], now_ms: u64) -> bool {
        if messages.is_empty() {
            return false;
        }
        let due = match self.last_spoken_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
            None => true,
        };
        if due {
            self.last_spoken_ms = Some(now_ms);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alerts() -> Vec<String> {
        vec![
            "Neck bending too far (47°)".to_string(),
            "Back not straight (12°)".to_string(),
        ]
    }

    #[test]
    fn first_alert_fires_immediately() {
        let mut throttle = FeedbackThrottle::default();
        assert!(throttle.maybe_speak(&alerts(), 1_000));
    }

    #[test]
    fn second_alert_within_quiet_period_is_dropped() {
        let mut throttle = FeedbackThrottle::default();
        assert!(throttle.maybe_speak(&alerts(), 1_000));
        assert!(!throttle.maybe_speak(&alerts(), 5_999));
    }

    #[test]
    fn alert_at_exactly_the_interval_fires_again() {
        let mut throttle = FeedbackThrottle::default();
        assert!(throttle.maybe_speak(&alerts(), 1_000));
        assert!(!throttle.maybe_speak(&alerts(), 5_999));
        assert!(throttle.maybe_speak(&alerts(), 6_000));
    }

    #[test]
    fn dropped_alerts_do_not_reset_the_clock() {
        let mut throttle = FeedbackThrottle::default();
        assert!(throttle.maybe_speak(&alerts(), 0));
        // Dropped at 4_000; if that call had updated the timestamp, the call
        // at 5_000 would be dropped too.
        assert!(!throttle.maybe_speak(&alerts(), 4_000));
        assert!(throttle.maybe_speak(&alerts(), 5_000));
    }

    #[test]
    fn empty_message_batch_never_speaks_or_ticks() {
        let mut throttle = FeedbackThrottle::default();
        assert!(!throttle.maybe_speak(&[], 1_000));
        // A silent frame must not have started the quiet period.
        assert!(throttle.maybe_speak(&alerts(), 1_001));
    }
}
