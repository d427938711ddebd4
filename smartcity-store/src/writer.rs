use chrono::{DateTime, Utc};
use smartcity_core::Schema;
use smartcity_mq::{Envelope, StreamReader};
use std::{marker::PhantomData, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    checkpoint::{BatchCommit, BatchPlan, CheckpointStore},
    error::{Result, StoreError},
    segment::Segment,
    sink::Sink,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Time between two micro-batches.
    pub trigger_interval: Duration,

    /// Consecutive empty reads after which replaying an uncommitted batch
    /// gives up.
    pub replay_attempts: u32,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            trigger_interval: Duration::from_millis(500),
            replay_attempts: 20,
        }
    }
}

/// What [`StreamWriter::recover`] found in the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    Fresh,
    Resumed { batch_id: u64 },
    Replayed { batch_id: u64, rows: usize },
}

/// Appends one stream to a [`Sink`], tracking progress in a
/// [`CheckpointStore`] so every broker offset is written at most once.
pub struct StreamWriter<S: Schema> {
    checkpoint: Box<dyn CheckpointStore>,
    sink: Box<dyn Sink>,
    options: WriterOptions,
    next_batch: u64,
    recovered: bool,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> StreamWriter<S> {
    pub fn new<C, K>(checkpoint: C, sink: K) -> Self
    where
        C: CheckpointStore + 'static,
        K: Sink + 'static,
    {
        Self {
            checkpoint: Box::new(checkpoint),
            sink: Box::new(sink),
            options: WriterOptions::default(),
            next_batch: 0,
            recovered: false,
            _schema: PhantomData,
        }
    }

    pub fn options(mut self, options: WriterOptions) -> Self {
        self.options = options;

        self
    }

    /// Id the next planned batch will get.
    pub fn next_batch(&self) -> u64 {
        self.next_batch
    }

    /// Positions `reader` after the last committed batch, replaying the last
    /// planned batch first when its commit marker is missing.
    pub async fn recover(&mut self, reader: &mut StreamReader<S>) -> Result<Recovery> {
        self.recovered = true;

        let Some(checkpoint) = self.checkpoint.latest().await? else {
            debug!(topic = %S::TOPIC, "no checkpoint, reading from earliest offsets");
            return Ok(Recovery::Fresh);
        };

        let plan = checkpoint.plan.clone();
        self.next_batch = plan.batch_id + 1;

        if let Some(commit) = checkpoint.commit.filter(|c| c.batch_id == plan.batch_id) {
            reader.seek(&plan.end).await?;
            reader.restore_watermark(commit.max_event_time);

            info!(
                topic = %S::TOPIC,
                batch_id = plan.batch_id,
                "resuming after committed batch"
            );

            return Ok(Recovery::Resumed {
                batch_id: plan.batch_id,
            });
        }

        warn!(
            topic = %S::TOPIC,
            batch_id = plan.batch_id,
            "replaying uncommitted batch"
        );

        reader.restore_watermark(plan.max_event_time);

        let envelopes = reader
            .replay(&plan.start, &plan.end, self.options.replay_attempts)
            .await?
            .ok_or_else(|| StoreError::ReplayIncomplete {
                batch_id: plan.batch_id,
                reason: "broker no longer holds the planned offsets".to_owned(),
            })?;

        let rows = envelopes.len();
        self.write_batch(&plan, &envelopes, reader.max_event_time())
            .await?;

        Ok(Recovery::Replayed {
            batch_id: plan.batch_id,
            rows,
        })
    }

    /// Reads one micro-batch and writes it. `None` when nothing was read.
    pub async fn step(&mut self, reader: &mut StreamReader<S>) -> Result<Option<BatchCommit>> {
        if !self.recovered {
            self.recover(reader).await?;
        }

        let start = reader.positions().clone();
        let max_event_time = reader.max_event_time();
        let envelopes = reader.poll().await?;

        if envelopes.is_empty() {
            return Ok(None);
        }

        let plan = BatchPlan {
            batch_id: self.next_batch,
            start,
            end: reader.positions().clone(),
            max_event_time,
        };

        self.write_batch(&plan, &envelopes, reader.max_event_time())
            .await
            .map(Some)
    }

    async fn write_batch(
        &mut self,
        plan: &BatchPlan,
        envelopes: &[Envelope<S>],
        max_event_time: Option<DateTime<Utc>>,
    ) -> Result<BatchCommit> {
        self.checkpoint.plan(plan).await?;
        self.sink
            .append(Segment::from_batch(plan.batch_id, envelopes))
            .await?;

        let commit = BatchCommit {
            batch_id: plan.batch_id,
            max_event_time,
            rows: envelopes.len(),
            committed_at: Utc::now(),
        };

        self.checkpoint.commit(&commit).await?;
        self.next_batch = plan.batch_id + 1;

        info!(
            topic = %S::TOPIC,
            batch_id = commit.batch_id,
            rows = commit.rows,
            late = envelopes.iter().filter(|e| e.status.is_expired()).count(),
            "batch committed"
        );

        Ok(commit)
    }

    /// Writes micro-batches on every trigger until `token` is cancelled.
    ///
    /// A batch in progress when cancellation arrives is finished first.
    #[tracing::instrument(skip_all, fields(topic = %S::TOPIC))]
    pub async fn write(
        &mut self,
        reader: &mut StreamReader<S>,
        token: &CancellationToken,
    ) -> Result<()> {
        if !self.recovered {
            self.recover(reader).await?;
        }

        let mut trigger = interval(self.options.trigger_interval);
        trigger.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    debug!("write cancelled");
                    return Ok(());
                }
                _ = trigger.tick() => {
                    self.step(reader).await?;
                }
            }
        }
    }
}
