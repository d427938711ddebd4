mod writer;

use smartcity_core::GpsRow;
use smartcity_mq::MemoryBroker;
use smartcity_store::{MemoryCheckpoint, MemorySink, Sink, StreamWriter, WriterOptions};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

#[tokio::test]
async fn write_every_record() {
    writer::test_write_every_record(&MemoryCheckpoint::new(), &MemorySink::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn exactly_once_resume() {
    writer::test_exactly_once_resume(&MemoryCheckpoint::new(), &MemorySink::new())
        .await
        .unwrap();
}

#[tokio::test]
#[traced_test]
async fn replay_uncommitted_batch() {
    writer::test_replay_uncommitted_batch(&MemoryCheckpoint::new(), &MemorySink::new())
        .await
        .unwrap();

    assert!(logs_contain("replaying uncommitted batch"));
}

#[tokio::test]
async fn replay_gives_up() {
    writer::test_replay_gives_up(&MemoryCheckpoint::new(), &MemorySink::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn late_rows_are_flagged() {
    writer::test_late_rows_are_flagged(&MemoryCheckpoint::new(), &MemorySink::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn multi_partition_replay() {
    writer::test_multi_partition_replay(&MemoryCheckpoint::new(), &MemorySink::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn write_stops_on_cancel() {
    let broker = MemoryBroker::new();
    let checkpoint = MemoryCheckpoint::new();
    let sink = MemorySink::new();
    writer::publish(&broker, 0, 3).await.unwrap();

    let mut reader = writer::open(&broker).await.unwrap();
    let mut stream_writer = StreamWriter::<GpsRow>::new(checkpoint.clone(), sink.clone())
        .options(WriterOptions {
            trigger_interval: Duration::from_millis(10),
            ..Default::default()
        });

    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let token = token.clone();
        async move { stream_writer.write(&mut reader, &token).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    writer::publish(&broker, 3, 2).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    handle.await.unwrap().unwrap();

    assert_eq!(sink.scan().await.unwrap().len(), 5);
    assert_eq!(checkpoint.commits().len(), 2);
}

fn assert_send<T: Send>(_: &T) {}

#[tokio::test]
async fn writer_futures_are_send() {
    let broker = MemoryBroker::new();
    let mut reader = writer::open(&broker).await.unwrap();
    let mut stream_writer = StreamWriter::<GpsRow>::new(MemoryCheckpoint::new(), MemorySink::new());
    let token = CancellationToken::new();

    {
        let recover = stream_writer.recover(&mut reader);
        assert_send(&recover);
    }
    {
        let step = stream_writer.step(&mut reader);
        assert_send(&step);
    }

    let write = stream_writer.write(&mut reader, &token);
    assert_send(&write);
}
