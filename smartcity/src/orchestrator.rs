use tokio::{sync::watch, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::pipeline::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Starting,
    Running,
    Stopped,
}

/// Runs jobs concurrently until the first of them ends.
///
/// When any job stops or fails, or the shared token is cancelled from outside,
/// every job is cancelled and awaited. The first error, if any, is returned.
pub struct Orchestrator {
    jobs: Vec<Box<dyn Job>>,
    token: CancellationToken,
    state: watch::Sender<State>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl Orchestrator {
    pub fn new(token: CancellationToken) -> Self {
        let (state, _) = watch::channel(State::Starting);

        Self {
            jobs: Vec::new(),
            token,
            state,
        }
    }

    pub fn job(mut self, job: Box<dyn Job>) -> Self {
        self.jobs.push(job);

        self
    }

    pub fn jobs(mut self, jobs: impl IntoIterator<Item = Box<dyn Job>>) -> Self {
        self.jobs.extend(jobs);

        self
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let mut set = JoinSet::new();

        for job in self.jobs {
            let name = job.name();
            let token = self.token.child_token();

            info!(job = %name, "starting");
            set.spawn(async move { (name, job.run(token).await) });
        }

        self.state.send_replace(State::Running);

        let mut first_error = None;

        while let Some(joined) = set.join_next().await {
            self.token.cancel();

            let err = match joined {
                Ok((name, Ok(()))) => {
                    info!(job = %name, "stopped");
                    continue;
                }
                Ok((name, Err(e))) => {
                    error!(job = %name, "failed: {e:#}");
                    e.context(format!("job {name} failed"))
                }
                Err(e) => {
                    error!("job panicked or was aborted: {e}");
                    anyhow::Error::new(e)
                }
            };

            first_error.get_or_insert(err);
        }

        self.state.send_replace(State::Stopped);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
