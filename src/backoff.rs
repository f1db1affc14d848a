use std::time::Duration;

/// Linear backoff capped at `cap`: the delay after attempt `n` is
/// `min(cap, n * step)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub step: Duration,
    pub cap: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attempt {
    pub number: u32,
    pub delay_before_next: Duration,
}

impl Attempt {
    pub fn is_last(&self, backoff: &Backoff) -> bool {
        self.number >= backoff.max_attempts
    }
}

impl Backoff {
    pub fn new(max_attempts: u32, step: Duration, cap: Duration) -> Self {
        Self {
            max_attempts,
            step,
            cap,
        }
    }

    /// A single attempt with no wait, used by the one-shot sweep.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.cap)
    }

    pub fn attempts(&self) -> Attempts {
        Attempts {
            backoff: *self,
            next: 1,
        }
    }
}

impl IntoIterator for Backoff {
    type Item = Attempt;
    type IntoIter = Attempts;

    fn into_iter(self) -> Self::IntoIter {
        self.attempts()
    }
}

pub struct Attempts {
    backoff: Backoff,
    // Wider than `max_attempts` so the counter can step past `u32::MAX`.
    next: u64,
}

impl Iterator for Attempts {
    type Item = Attempt;

    fn next(&mut self) -> Option<Self::Item> {
        let number = u32::try_from(self.next)
            .ok()
            .filter(|number| *number <= self.backoff.max_attempts)?;
        self.next += 1;
        Some(Attempt {
            number,
            delay_before_next: self.backoff.delay_for(number),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (u64::from(self.backoff.max_attempts) + 1).saturating_sub(self.next);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Attempts {}
