//! Column-major data files.
//!
//! A batch is split into one segment per (broker partition, time partition)
//! pair. The segment's path depends only on those and the batch id, so writing
//! a batch twice replaces the same files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smartcity_core::Schema;
use smartcity_mq::Envelope;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub const PARTITION_COLUMN: &str = "_partition";
pub const OFFSET_COLUMN: &str = "_offset";
pub const LATE_COLUMN: &str = "_late";

/// Directory for rows without an event time.
pub const DEFAULT_TIME_PARTITION: &str = "date=__HIVE_DEFAULT_PARTITION__";

/// `date=YYYY-MM-DD/hour=HH` of an event time.
pub fn time_partition(event_time: Option<DateTime<Utc>>) -> String {
    match event_time {
        Some(ts) => ts.format("date=%Y-%m-%d/hour=%H").to_string(),
        None => DEFAULT_TIME_PARTITION.to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub batch_id: u64,
    pub partition: i32,
    pub time_partition: String,
    pub columns: Vec<Column>,
}

impl Segment {
    fn empty<S: Schema>(batch_id: u64, partition: i32, time_partition: String) -> Self {
        let columns = S::FIELDS
            .iter()
            .map(|f| f.name)
            .chain([PARTITION_COLUMN, OFFSET_COLUMN, LATE_COLUMN])
            .map(|name| Column {
                name: name.to_owned(),
                values: Vec::new(),
            })
            .collect();

        Self {
            batch_id,
            partition,
            time_partition,
            columns,
        }
    }

    fn push<S: Schema>(&mut self, envelope: &Envelope<S>) {
        let values = envelope.record.values().into_iter().chain([
            Value::from(envelope.partition),
            Value::from(envelope.offset),
            Value::from(envelope.status),
        ]);

        for (column, value) in self.columns.iter_mut().zip(values) {
            column.values.push(value);
        }
    }

    /// Groups a batch of records into segments.
    pub fn from_batch<S: Schema>(batch_id: u64, envelopes: &[Envelope<S>]) -> Vec<Segment> {
        let mut segments: BTreeMap<(i32, String), Segment> = BTreeMap::new();

        for envelope in envelopes {
            let time_partition = time_partition(envelope.record.event_time());

            segments
                .entry((envelope.partition, time_partition.to_owned()))
                .or_insert_with(|| Self::empty::<S>(batch_id, envelope.partition, time_partition))
                .push(envelope);
        }

        segments.into_values().collect()
    }

    pub fn file_name(&self) -> String {
        format!("part-{:05}-{:03}.json", self.batch_id, self.partition)
    }

    /// Path relative to the stream's output directory.
    pub fn path(&self) -> PathBuf {
        Path::new(&self.time_partition).join(self.file_name())
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that every column holds the same number of values.
    pub fn validate(&self) -> Result<(), String> {
        let len = self.len();

        match self.columns.iter().find(|c| c.values.len() != len) {
            Some(column) => Err(format!(
                "column `{}` has {} values, expected {len}",
                column.name,
                column.values.len()
            )),
            None => Ok(()),
        }
    }

    /// Row-major view of the segment. Missing values of a short column read
    /// as null.
    pub fn rows(&self) -> Vec<Map<String, Value>> {
        (0..self.len())
            .map(|i| {
                self.columns
                    .iter()
                    .map(|c| {
                        let value = c.values.get(i).cloned().unwrap_or(Value::Null);
                        (c.name.to_owned(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use smartcity_core::GpsRow;
    use smartcity_mq::WatermarkStatus;

    fn envelope(partition: i32, offset: i64, hour: Option<u32>) -> Envelope<GpsRow> {
        Envelope {
            partition,
            offset,
            key: None,
            record: GpsRow {
                id: Some(offset.to_string()),
                timestamp: hour.map(|h| Utc.with_ymd_and_hms(2024, 3, 9, h, 5, 0).unwrap()),
                ..Default::default()
            },
            status: WatermarkStatus::OnTime,
        }
    }

    #[test]
    fn splits_by_partition_and_hour() {
        let batch = [
            envelope(0, 0, Some(8)),
            envelope(0, 1, Some(9)),
            envelope(1, 0, Some(8)),
            envelope(0, 2, Some(8)),
            envelope(0, 3, None),
        ];

        let paths: Vec<_> = Segment::from_batch(7, &batch)
            .iter()
            .map(|s| (s.path(), s.len()))
            .collect();

        assert_eq!(
            paths,
            vec![
                (PathBuf::from("date=2024-03-09/hour=08/part-00007-000.json"), 2),
                (PathBuf::from("date=2024-03-09/hour=09/part-00007-000.json"), 1),
                (
                    PathBuf::from("date=__HIVE_DEFAULT_PARTITION__/part-00007-000.json"),
                    1
                ),
                (PathBuf::from("date=2024-03-09/hour=08/part-00007-001.json"), 1),
            ]
        );
    }

    #[test]
    fn rows_carry_lineage_columns() {
        let segments = Segment::from_batch(0, &[envelope(2, 41, Some(8))]);
        let rows = segments[0].rows();

        assert_eq!(rows[0]["id"], Value::from("41"));
        assert_eq!(rows[0]["deviceID"], Value::Null);
        assert_eq!(rows[0][PARTITION_COLUMN], Value::from(2));
        assert_eq!(rows[0][OFFSET_COLUMN], Value::from(41));
        assert_eq!(rows[0][LATE_COLUMN], Value::Bool(false));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let envelopes = [envelope(0, 1, Some(8)), envelope(0, 2, Some(8))];
        let mut segment = Segment::from_batch(0, &envelopes).remove(0);
        assert_eq!(segment.validate(), Ok(()));

        segment.columns[3].values.pop();

        let reason = segment.validate().unwrap_err();
        assert!(reason.contains("has 1 values, expected 2"), "{reason}");
        let name = segment.columns[3].name.to_owned();
        assert_eq!(segment.rows()[1][name.as_str()], Value::Null);
    }
}
