use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::Value;
use smartcity_core::{GpsRow, TelemetryEvent};
use smartcity_mq::{
    Dispatcher, MemoryBroker, Offsets, ReaderOptions, StreamReader,
};
use smartcity_sim::{EventFactory, VehicleProfile};
use smartcity_store::{
    BatchPlan, CheckpointStore, Recovery, Result, Segment, Sink, StoreError, StreamWriter,
    WriterOptions, LATE_COLUMN, OFFSET_COLUMN, PARTITION_COLUMN,
};
use std::collections::HashSet;

pub const TOPIC: &str = "gps_data";

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

/// Publishes `count` gps events one minute apart, starting `from` minutes in.
pub async fn publish(broker: &MemoryBroker, from: i64, count: i64) -> Result<()> {
    let dispatcher = Dispatcher::new(broker.clone());
    let mut factory = EventFactory::new(from as u64, "vehicle-car-1", VehicleProfile::default());

    for minute in from..from + count {
        let event: TelemetryEvent = factory.gps(start() + TimeDelta::minutes(minute)).into();
        dispatcher.publish(TOPIC, &event).await?;
    }

    Ok(())
}

pub async fn open(broker: &MemoryBroker) -> Result<StreamReader<GpsRow>> {
    open_with(broker, ReaderOptions::default()).await
}

pub async fn open_with(
    broker: &MemoryBroker,
    options: ReaderOptions,
) -> Result<StreamReader<GpsRow>> {
    Ok(StreamReader::open(broker, TOPIC, options).await?)
}

fn offsets(rows: &[serde_json::Map<String, Value>]) -> Vec<i64> {
    let mut offsets: Vec<_> = rows
        .iter()
        .filter_map(|row| row[OFFSET_COLUMN].as_i64())
        .collect();
    offsets.sort();

    offsets
}

pub async fn test_write_every_record<C, K>(checkpoint: &C, sink: &K) -> Result<()>
where
    C: CheckpointStore + Clone + 'static,
    K: Sink + Clone + 'static,
{
    let broker = MemoryBroker::new();
    publish(&broker, 0, 10).await?;

    let mut reader = open(&broker).await?;
    let mut writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone());

    assert_eq!(writer.recover(&mut reader).await?, Recovery::Fresh);

    let commit = writer.step(&mut reader).await?.expect("a batch");
    assert_eq!(commit.batch_id, 0);
    assert_eq!(commit.rows, 10);
    assert_eq!(commit.max_event_time, Some(start() + TimeDelta::minutes(9)));

    assert!(writer.step(&mut reader).await?.is_none());

    let rows = sink.scan().await?;
    assert_eq!(offsets(&rows), (0..10).collect::<Vec<_>>());

    let latest = checkpoint.latest().await?.expect("a checkpoint");
    assert!(latest.is_committed());
    assert_eq!(latest.plan.start, Offsets::new());
    assert_eq!(latest.plan.end, Offsets::from([(0, 10)]));

    Ok(())
}

pub async fn test_exactly_once_resume<C, K>(checkpoint: &C, sink: &K) -> Result<()>
where
    C: CheckpointStore + Clone + 'static,
    K: Sink + Clone + 'static,
{
    let broker = MemoryBroker::new();
    publish(&broker, 0, 6).await?;

    {
        let mut reader = open(&broker).await?;
        let mut writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone());
        writer.step(&mut reader).await?;
    }

    publish(&broker, 6, 4).await?;

    let mut reader = open(&broker).await?;
    let mut writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone());

    assert_eq!(
        writer.recover(&mut reader).await?,
        Recovery::Resumed { batch_id: 0 }
    );
    assert_eq!(
        reader.max_event_time(),
        Some(start() + TimeDelta::minutes(5))
    );

    let commit = writer.step(&mut reader).await?.expect("a batch");
    assert_eq!(commit.batch_id, 1);
    assert_eq!(commit.rows, 4);

    let rows = sink.scan().await?;
    assert_eq!(offsets(&rows), (0..10).collect::<Vec<_>>());

    let ids: HashSet<_> = rows.iter().map(|row| row["id"].to_string()).collect();
    assert_eq!(ids.len(), 10);

    Ok(())
}

pub async fn test_replay_uncommitted_batch<C, K>(checkpoint: &C, sink: &K) -> Result<()>
where
    C: CheckpointStore + Clone + 'static,
    K: Sink + Clone + 'static,
{
    let broker = MemoryBroker::new();
    publish(&broker, 0, 5).await?;

    let first = {
        let mut reader = open(&broker).await?;
        let mut writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone());
        writer.step(&mut reader).await?.expect("a batch")
    };

    publish(&broker, 5, 3).await?;

    // crash after planning batch 1 and writing part of its data
    let plan = BatchPlan {
        batch_id: 1,
        start: Offsets::from([(0, 5)]),
        end: Offsets::from([(0, 8)]),
        max_event_time: first.max_event_time,
    };
    checkpoint.plan(&plan).await?;

    let mut partial = open(&broker).await?;
    partial.seek(&plan.start).await?;
    let envelopes = partial.poll().await?;
    sink.append(Segment::from_batch(1, &envelopes[..1])).await?;

    assert_eq!(sink.scan().await?.len(), 6);

    let mut reader = open(&broker).await?;
    let mut writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone());

    assert_eq!(
        writer.recover(&mut reader).await?,
        Recovery::Replayed {
            batch_id: 1,
            rows: 3
        }
    );
    assert_eq!(reader.positions(), &plan.end);
    assert_eq!(writer.next_batch(), 2);

    let rows = sink.scan().await?;
    assert_eq!(offsets(&rows), (0..8).collect::<Vec<_>>());
    assert!(checkpoint.latest().await?.expect("a checkpoint").is_committed());

    assert!(writer.step(&mut reader).await?.is_none());

    Ok(())
}

pub async fn test_replay_gives_up<C, K>(checkpoint: &C, sink: &K) -> Result<()>
where
    C: CheckpointStore + Clone + 'static,
    K: Sink + Clone + 'static,
{
    let broker = MemoryBroker::new();
    publish(&broker, 0, 2).await?;

    checkpoint
        .plan(&BatchPlan {
            batch_id: 0,
            start: Offsets::new(),
            end: Offsets::from([(0, 5)]),
            max_event_time: None,
        })
        .await?;

    let mut reader = open(&broker).await?;
    let mut writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone()).options(
        WriterOptions {
            replay_attempts: 2,
            ..Default::default()
        },
    );

    let err = writer.recover(&mut reader).await.unwrap_err();
    assert!(matches!(err, StoreError::ReplayIncomplete { batch_id: 0, .. }));
    assert!(sink.scan().await?.is_empty());

    Ok(())
}

pub async fn test_late_rows_are_flagged<C, K>(checkpoint: &C, sink: &K) -> Result<()>
where
    C: CheckpointStore + Clone + 'static,
    K: Sink + Clone + 'static,
{
    let broker = MemoryBroker::new();
    publish(&broker, 10, 1).await?;
    publish(&broker, 7, 1).await?;
    publish(&broker, 9, 1).await?;

    let mut reader = open(&broker).await?;
    let mut writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone());
    writer.step(&mut reader).await?;

    let mut late: Vec<_> = sink
        .scan()
        .await?
        .iter()
        .map(|row| (row[OFFSET_COLUMN].as_i64(), row[LATE_COLUMN].as_bool()))
        .collect();
    late.sort();

    assert_eq!(
        late,
        vec![
            (Some(0), Some(false)),
            (Some(1), Some(true)),
            (Some(2), Some(false)),
        ]
    );

    Ok(())
}

pub async fn test_multi_partition_replay<C, K>(checkpoint: &C, sink: &K) -> Result<()>
where
    C: CheckpointStore + Clone + 'static,
    K: Sink + Clone + 'static,
{
    let broker = MemoryBroker::with_partitions(3);
    publish(&broker, 0, 30).await?;

    let options = ReaderOptions {
        max_records_per_poll: 7,
        ..Default::default()
    };

    let (start, max_event_time) = {
        let mut reader = open_with(&broker, options.clone()).await?;
        let mut writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone());
        writer.step(&mut reader).await?.expect("a batch");
        writer.step(&mut reader).await?.expect("a batch");

        (reader.positions().clone(), reader.max_event_time())
    };

    // crash after planning batch 2 and writing part of its data
    let mut partial = open_with(&broker, options.clone()).await?;
    partial.seek(&start).await?;
    let envelopes = partial.poll().await?;
    assert_eq!(envelopes.len(), 7);

    let plan = BatchPlan {
        batch_id: 2,
        start,
        end: partial.positions().clone(),
        max_event_time,
    };
    checkpoint.plan(&plan).await?;
    sink.append(Segment::from_batch(2, &envelopes[..2])).await?;

    let mut reader = open_with(&broker, options).await?;
    let mut writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone());

    assert_eq!(
        writer.recover(&mut reader).await?,
        Recovery::Replayed {
            batch_id: 2,
            rows: 7
        }
    );
    assert_eq!(reader.positions(), &plan.end);

    while writer.step(&mut reader).await?.is_some() {}

    let rows = sink.scan().await?;
    let mut pairs: Vec<_> = rows
        .iter()
        .map(|row| {
            (
                row[PARTITION_COLUMN].as_i64().expect("a partition"),
                row[OFFSET_COLUMN].as_i64().expect("an offset"),
            )
        })
        .collect();
    pairs.sort();

    let unique: HashSet<_> = pairs.iter().copied().collect();
    assert_eq!(pairs.len(), 30);
    assert_eq!(unique.len(), 30);

    // offsets are contiguous from zero within every partition
    for partition in 0..3 {
        let offsets: Vec<_> = pairs
            .iter()
            .filter(|(p, _)| *p == partition)
            .map(|(_, o)| *o)
            .collect();
        assert_eq!(offsets, (0..offsets.len() as i64).collect::<Vec<_>>());
    }

    Ok(())
}
