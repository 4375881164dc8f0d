//! Backlog estimation.
//!
//! The lag of a partition is the number of records between the offset the
//! group would consume next and the log end offset.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::cluster::{OffsetSource, TopicMetadata};
use crate::error::{Error, OffsetKind, Result};
use crate::topic::TopicPartition;

/// Where a consumer starts when the group has no committed offset.
///
/// Mirrors the consumer's `auto.offset.reset` setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OffsetResetPolicy {
    Earliest,
    #[default]
    Latest,
}

impl FromStr for OffsetResetPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("earliest") {
            Ok(Self::Earliest)
        } else if s.eq_ignore_ascii_case("latest") {
            Ok(Self::Latest)
        } else {
            Err(Error::Configuration(format!(
                "invalid offset reset policy '{s}', expected 'earliest' or 'latest'"
            )))
        }
    }
}

impl fmt::Display for OffsetResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Earliest => write!(f, "earliest"),
            Self::Latest => write!(f, "latest"),
        }
    }
}

/// The backlog of a single partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLag {
    pub topic: String,
    pub partition: i32,
    /// Never negative.
    pub lag: i64,
}

/// Topics with known metadata, their partitions and the lag of each.
///
/// A topic missing from the report means "no information", not "no lag".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LagReport {
    pub partitions: BTreeMap<String, Vec<i32>>,
    pub lags: BTreeMap<String, Vec<PartitionLag>>,
}

/// Computes the lag of one partition.
///
/// Without a committed offset the next offset follows the reset policy. The
/// result is clamped at zero since the three offsets are read independently
/// and may be momentarily inconsistent.
pub fn compute_partition_lag(
    committed: Option<i64>,
    begin: i64,
    end: i64,
    policy: OffsetResetPolicy,
) -> i64 {
    let next = match (committed, policy) {
        (Some(committed), _) => committed,
        (None, OffsetResetPolicy::Latest) => end,
        (None, OffsetResetPolicy::Earliest) => begin,
    };

    end.saturating_sub(next).max(0)
}

/// Reads the lag of every partition of the given topics.
///
/// Topics without metadata are skipped. Any failing offset lookup fails the
/// whole estimation.
pub async fn estimate_lag(
    metadata: &dyn TopicMetadata,
    offsets: &dyn OffsetSource,
    topics: &BTreeSet<String>,
    policy: OffsetResetPolicy,
) -> Result<LagReport> {
    let mut report = LagReport::default();

    for topic in topics {
        let partitions = match metadata.partitions_for_topic(topic) {
            Some(partitions) if !partitions.is_empty() => partitions,
            _ => {
                info!(
                    message = "skipping topic since no metadata is available",
                    topic = topic.as_str(),
                );
                continue;
            }
        };

        let fetch_err = |kind| {
            let topic = topic.clone();
            move |source| Error::OffsetFetch {
                topic,
                kind,
                source,
            }
        };
        let begin = offsets
            .beginning_offsets(&partitions)
            .await
            .map_err(fetch_err(OffsetKind::Beginning))?;
        let end = offsets
            .end_offsets(&partitions)
            .await
            .map_err(fetch_err(OffsetKind::End))?;
        let committed = offsets
            .committed_offsets(&partitions)
            .await
            .map_err(fetch_err(OffsetKind::Committed))?;

        let mut lags = Vec::with_capacity(partitions.len());
        for tp in &partitions {
            let lag = compute_partition_lag(
                committed.get(tp).copied().flatten(),
                begin.get(tp).copied().unwrap_or_default(),
                end.get(tp).copied().unwrap_or_default(),
                policy,
            );
            debug!(topic = tp.topic.as_str(), partition = tp.partition, lag);

            lags.push(PartitionLag {
                topic: tp.topic.clone(),
                partition: tp.partition,
                lag,
            });
        }

        report.partitions.insert(
            topic.clone(),
            partitions.iter().map(|tp| tp.partition).collect(),
        );
        report.lags.insert(topic.clone(), lags);
    }

    Ok(report)
}
