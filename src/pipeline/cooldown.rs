use std::time::{Duration, Instant};

/// Suppresses repeated lookups of a name that is still in frame.
///
/// A name different from the last one always passes and restarts the
/// clock. The same name passes again only once `interval` has elapsed
/// since it was last recorded.
#[derive(Debug)]
pub struct DedupeCooldown {
    interval: Duration,
    last: Option<(String, Instant)>,
}

impl DedupeCooldown {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn should_lookup(&self, name: &str, now: Instant) -> bool {
        match &self.last {
            None => true,
            Some((last_name, _)) if last_name != name => true,
            Some((_, at)) => now.saturating_duration_since(*at) >= self.interval,
        }
    }

    /// Marks `name` as handed to the lookup stage at `now`.
    pub fn record(&mut self, name: &str, now: Instant) {
        self.last = Some((name.to_string(), now));
    }
}
