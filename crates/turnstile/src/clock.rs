use std::time::Instant;

/// Milliseconds since the server started, shared by every connection.
///
/// Backed by a monotonic [`Instant`], so timestamps never go backwards.
#[derive(Debug, Clone, Copy)]
pub struct ServerClock {
    start: Instant,
}

impl ServerClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_millis(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for ServerClock {
    fn default() -> Self {
        Self::start()
    }
}
