use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Why [`Scheduler::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Cancelled,
    DeadlineReached,
}

/// Paces the producer loop. Waiting ends early on cancellation or once the
/// deadline passes.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Scheduler {
    pub fn new(interval: Duration, token: CancellationToken) -> Self {
        Self {
            interval,
            token,
            deadline: None,
        }
    }

    /// Sets the deadline `after` from now.
    pub fn deadline(mut self, after: Duration) -> Self {
        self.deadline = Some(Instant::now() + after);

        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Wake reason if the loop must stop now, without waiting.
    pub fn stopped(&self) -> Option<Wake> {
        if self.token.is_cancelled() {
            return Some(Wake::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Wake::DeadlineReached),
            _ => None,
        }
    }

    pub async fn wait(&self) -> Wake {
        if let Some(wake) = self.stopped() {
            return wake;
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            _ = self.token.cancelled() => Wake::Cancelled,
            _ = deadline => Wake::DeadlineReached,
            _ = sleep(self.interval) => Wake::Elapsed,
        }
    }
}
