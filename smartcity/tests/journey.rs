use chrono::{TimeZone, Utc};
use smartcity::{CancellationToken, Journey, JourneyOutcome, ProducerConfig, Scheduler};
use smartcity_core::{GpsRow, Schema, Topic, VehicleRow};
use smartcity_mq::{Dispatcher, MemoryBroker};
use smartcity_sim::{Arrival, Route, SimulatorConfig, BIRMINGHAM, LONDON};
use std::time::Duration;
use tracing_test::traced_test;

fn config() -> ProducerConfig {
    ProducerConfig {
        start: Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()),
        tick_interval: Duration::from_secs(5),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn journey_publishes_four_records_per_tick_until_arrival() {
    let broker = MemoryBroker::new();
    let scheduler = Scheduler::new(Duration::from_secs(5), CancellationToken::new());

    let outcome = Journey::new(config(), broker.clone(), scheduler)
        .run()
        .await
        .unwrap();

    let JourneyOutcome::Arrived { published } = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert!((94..=104).contains(&published), "{published}");

    for topic in Topic::ALL {
        assert_eq!(
            broker.messages(topic.default_name()).len(),
            published as usize,
            "{topic}"
        );
    }

    let vehicles: Vec<_> = broker
        .messages("vehicle_data")
        .iter()
        .map(|m| VehicleRow::decode(&m.payload))
        .collect();
    let gps: Vec<_> = broker
        .messages("gps_data")
        .iter()
        .map(|m| GpsRow::decode(&m.payload))
        .collect();

    for (vehicle, gps) in vehicles.iter().zip(gps.iter()) {
        assert_eq!(vehicle.timestamp, gps.timestamp);
        assert_eq!(vehicle.direction.as_deref(), Some("North-West"));
        assert_eq!(vehicle.device_id.as_deref(), Some("vehicle-car-1"));
    }

    for pair in vehicles.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }

    // the arrival tick itself is not published
    let last = vehicles.last().and_then(|v| v.location).unwrap();
    assert!(last.latitude < BIRMINGHAM.latitude || last.longitude > BIRMINGHAM.longitude);
}

#[tokio::test(start_paused = true)]
async fn same_seed_publishes_same_records() {
    let mut payloads = Vec::new();

    for _ in 0..2 {
        let broker = MemoryBroker::new();
        let scheduler = Scheduler::new(Duration::from_secs(5), CancellationToken::new())
            .deadline(Duration::from_secs(21));

        let outcome = Journey::new(config(), broker.clone(), scheduler)
            .run()
            .await
            .unwrap();
        assert_eq!(outcome, JourneyOutcome::DeadlineReached { published: 5 });

        payloads.push(
            broker
                .messages("weather_data")
                .into_iter()
                .map(|m| m.payload)
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(payloads[0], payloads[1]);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_between_ticks() {
    let broker = MemoryBroker::new();
    let token = CancellationToken::new();
    let scheduler = Scheduler::new(Duration::from_secs(5), token.clone());

    let handle = tokio::spawn(Journey::new(config(), broker.clone(), scheduler).run());

    tokio::time::sleep(Duration::from_secs(12)).await;
    token.cancel();

    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, JourneyOutcome::Cancelled { published: 3 });
    assert_eq!(broker.messages("traffic_data").len(), 3);
}

#[tokio::test(start_paused = true)]
async fn tick_limit_ends_a_journey_that_cannot_arrive() {
    let broker = MemoryBroker::new();
    let scheduler = Scheduler::new(Duration::from_millis(1), CancellationToken::new());
    let config = ProducerConfig {
        // a thousand steps to go, far beyond the limit
        route: Route::new(BIRMINGHAM, LONDON).unwrap(),
        simulator: SimulatorConfig {
            arrival: Arrival::Projection,
            steps: 1000,
            jitter: 0.0,
            max_ticks: 20,
            ..Default::default()
        },
        ..config()
    };

    let outcome = Journey::new(config, broker.clone(), scheduler)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, JourneyOutcome::TickLimit { published: 20 });
    assert_eq!(broker.messages("gps_data").len(), 20);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn failed_deliveries_are_logged_and_the_journey_continues() {
    let broker = MemoryBroker::new();
    broker.fail_deliveries("gps_data");
    let scheduler = Scheduler::new(Duration::from_secs(5), CancellationToken::new())
        .deadline(Duration::from_secs(11));

    let outcome = Journey::new(config(), broker.clone(), scheduler)
        .dispatcher(Dispatcher::new(broker.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, JourneyOutcome::DeadlineReached { published: 3 });
    assert!(broker.messages("gps_data").is_empty());
    assert_eq!(broker.messages("vehicle_data").len(), 3);
    assert!(logs_contain("message delivery to gps_data failed"));
}

#[tokio::test(start_paused = true)]
async fn flush_failure_ends_the_journey_with_an_error() {
    let broker = MemoryBroker::new();
    broker.fail_flush("broker unreachable");
    let scheduler = Scheduler::new(Duration::from_secs(5), CancellationToken::new());
    let err = Journey::new(config(), broker, scheduler)
        .run()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("broker unreachable"));
}

#[tokio::test(start_paused = true)]
async fn config_paces_and_bounds_the_journey() {
    let broker = MemoryBroker::new();
    let config = ProducerConfig {
        tick_interval: Duration::from_secs(10),
        deadline: Some(Duration::from_secs(25)),
        ..config()
    };
    let scheduler = config.scheduler(CancellationToken::new());
    let started = tokio::time::Instant::now();

    let outcome = Journey::new(config, broker.clone(), scheduler)
        .run()
        .await
        .unwrap();

    // ticks at 0s, 10s and 20s, then the deadline at 25s
    assert_eq!(outcome, JourneyOutcome::DeadlineReached { published: 3 });
    assert_eq!(started.elapsed(), Duration::from_secs(25));
    assert_eq!(broker.messages("vehicle_data").len(), 3);
}
