use std::time::Duration;

/// Runtime tuning.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RuntimeConfig {
    /// Period of the native event drain.
    pub poll_interval: Duration,

    /// Capacity of each window's event queue. Events beyond it are dropped.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            event_capacity: 64,
        }
    }
}

impl RuntimeConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Replaces values the runtime cannot work with: a zero interval becomes 1 ms and a
    /// zero capacity becomes 1.
    pub fn sanitized(self) -> Self {
        Self {
            poll_interval: self.poll_interval.max(Duration::from_millis(1)),
            event_capacity: self.event_capacity.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = RuntimeConfig::default();
        assert_eq!(c.poll_interval, Duration::from_millis(20));
        assert_eq!(c.event_capacity, 64);
    }

    #[test]
    fn zero_values_are_sanitized() {
        let c = RuntimeConfig::default()
            .with_poll_interval(Duration::ZERO)
            .with_event_capacity(0)
            .sanitized();
        assert_eq!(c.poll_interval, Duration::from_millis(1));
        assert_eq!(c.event_capacity, 1);
    }

    #[test]
    fn sane_values_pass_through() {
        let c = RuntimeConfig::default()
            .with_poll_interval(Duration::from_millis(5))
            .with_event_capacity(3)
            .sanitized();
        assert_eq!(c, RuntimeConfig { poll_interval: Duration::from_millis(5), event_capacity: 3 });
    }
}
