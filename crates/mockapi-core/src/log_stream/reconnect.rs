use std::time::Duration;

/// What a log stream consumer does after its channel errors or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Report the terminal status and stay there.
    #[default]
    Never,
    /// Reopen the channel with exponential backoff.
    ///
    /// `max_attempts` counts consecutive failed reconnects; reaching `Live`
    /// resets the count.
    Backoff {
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
    },
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based), or `None` when the
    /// policy gives up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        match *self {
            Self::Never => None,
            Self::Backoff {
                max_attempts,
                initial_delay,
                max_delay,
            } => {
                if attempt == 0 || attempt > max_attempts {
                    return None;
                }
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                Some(initial_delay.saturating_mul(factor).min(max_delay))
            }
        }
    }
}
