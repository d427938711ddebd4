use chrono::Utc;
use smartcity_mq::{Broker, Dispatcher};
use smartcity_sim::{EventFactory, JourneySimulator};
use tracing::{info, warn};

use crate::{
    config::ProducerConfig,
    scheduler::{Scheduler, Wake},
};

/// How a journey ended. `published` counts the ticks whose events were sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JourneyOutcome {
    Arrived { published: u32 },
    TickLimit { published: u32 },
    Cancelled { published: u32 },
    DeadlineReached { published: u32 },
}

impl JourneyOutcome {
    pub fn published(&self) -> u32 {
        match self {
            JourneyOutcome::Arrived { published }
            | JourneyOutcome::TickLimit { published }
            | JourneyOutcome::Cancelled { published }
            | JourneyOutcome::DeadlineReached { published } => *published,
        }
    }
}

/// The producer loop: tick, publish the tick's four events, wait, repeat.
pub struct Journey {
    config: ProducerConfig,
    dispatcher: Dispatcher,
    scheduler: Scheduler,
}

impl Journey {
    pub fn new<B: Broker + 'static>(config: ProducerConfig, broker: B, scheduler: Scheduler) -> Self {
        let dispatcher = Dispatcher::new(broker).topics(config.topics.clone());

        Self {
            config,
            dispatcher,
            scheduler,
        }
    }

    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher.topics(self.config.topics.clone());

        self
    }

    #[tracing::instrument(skip_all, fields(device_id = %self.config.device_id))]
    pub async fn run(self) -> anyhow::Result<JourneyOutcome> {
        let config = self.config;
        let mut simulator = JourneySimulator::new(config.seed, config.simulator.clone());
        let mut factory = EventFactory::new(
            config.seed.wrapping_add(0xDEAD_BEEF),
            config.device_id.to_owned(),
            config.profile.clone(),
        )
        .heading(config.route.heading());

        let mut state = simulator.start(&config.route, config.start.unwrap_or_else(Utc::now))?;
        let mut published = 0;

        info!(
            origin = ?config.route.origin,
            destination = ?config.route.destination,
            "journey started"
        );

        loop {
            match self.scheduler.stopped() {
                Some(Wake::Cancelled) => return Ok(JourneyOutcome::Cancelled { published }),
                Some(Wake::DeadlineReached) => {
                    return Ok(JourneyOutcome::DeadlineReached { published })
                }
                _ => {}
            }

            if published >= simulator.config().max_ticks {
                warn!(published, "tick limit reached before arrival");
                return Ok(JourneyOutcome::TickLimit { published });
            }

            let (position, timestamp) = simulator.tick(&mut state);

            if simulator.has_arrived(&state) {
                info!(published, "vehicle has reached the destination");
                return Ok(JourneyOutcome::Arrived { published });
            }

            let events = factory.tick(position, timestamp);
            self.dispatcher.publish_tick(events.into_events()).await?;
            published += 1;

            match self.scheduler.wait().await {
                Wake::Elapsed => {}
                Wake::Cancelled => {
                    info!(published, "journey cancelled");
                    return Ok(JourneyOutcome::Cancelled { published });
                }
                Wake::DeadlineReached => {
                    info!(published, "journey deadline reached");
                    return Ok(JourneyOutcome::DeadlineReached { published });
                }
            }
        }
    }
}
