//! Collaborators the assignor reads cluster state from.
//!
//! Both are implemented by the host client. The assignor never retries and
//! never times out a call; a failing call fails the rebalance.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::topic::TopicPartition;

/// Topic metadata as last seen by the group leader.
pub trait TopicMetadata: Send + Sync {
    /// Returns the partitions of `topic`, or `None` if the topic is unknown.
    fn partitions_for_topic(&self, topic: &str) -> Option<Vec<TopicPartition>>;
}

/// Offsets of partitions and of the consumer group.
///
/// Every method may return a map that lacks some of the requested partitions.
#[async_trait]
pub trait OffsetSource: Send + Sync {
    /// The log start offset of each partition.
    async fn beginning_offsets(
        &self,
        partitions: &[TopicPartition],
    ) -> Result<BTreeMap<TopicPartition, i64>, SourceError>;

    /// The log end offset of each partition.
    async fn end_offsets(
        &self,
        partitions: &[TopicPartition],
    ) -> Result<BTreeMap<TopicPartition, i64>, SourceError>;

    /// The offset last committed by the group, `None` if it never committed.
    async fn committed_offsets(
        &self,
        partitions: &[TopicPartition],
    ) -> Result<BTreeMap<TopicPartition, Option<i64>>, SourceError>;
}
