use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{
    bin_pack, AssignmentInput, GroupAssignment, GroupSubscription, PartitionAssignor,
    RebalanceState, ASSIGNOR_NAME,
};
use crate::cluster::{OffsetSource, TopicMetadata};
use crate::config::AssignorConfig;
use crate::error::{Error, Result};
use crate::lag::{estimate_lag, LagReport};
use crate::protocol::member_data::MemberData;
use crate::topic::TopicPartition;

/// Assignor that balances partition count and lag while keeping partitions
/// with their previous owner where that costs no balance.
///
/// Every member of the group runs one. Only the elected leader computes
/// plans, but all members acknowledge assignments and report their owned
/// partitions through [`PartitionAssignor::subscription_user_data`].
pub struct LagAwareAssignor {
    config: AssignorConfig,
    metadata: Arc<dyn TopicMetadata>,
    offsets: Arc<dyn OffsetSource>,

    state: Mutex<RebalanceState>,
}

impl LagAwareAssignor {
    pub fn new(
        config: AssignorConfig,
        metadata: Arc<dyn TopicMetadata>,
        offsets: Arc<dyn OffsetSource>,
    ) -> Self {
        Self {
            config,
            metadata,
            offsets,
            state: Mutex::new(RebalanceState::default()),
        }
    }

    pub fn config(&self) -> &AssignorConfig {
        &self.config
    }

    /// A copy of the current rebalance state.
    pub fn state(&self) -> RebalanceState {
        self.state.lock().clone()
    }
}

impl std::fmt::Debug for LagAwareAssignor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LagAwareAssignor")
            .field("config", &self.config)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PartitionAssignor for LagAwareAssignor {
    fn name(&self) -> &'static str {
        ASSIGNOR_NAME
    }

    async fn estimate_lag(&self, topics: &BTreeSet<String>) -> Result<LagReport> {
        estimate_lag(
            self.metadata.as_ref(),
            self.offsets.as_ref(),
            topics,
            self.config.offset_reset(),
        )
        .await
    }

    async fn assign(&self, subscriptions: &GroupSubscription) -> Result<GroupAssignment> {
        let started = self.state.lock().generation;
        info!(
            message = "computing group assignment",
            group_id = self.config.group_id(),
            members = subscriptions.len(),
            generation = started,
        );

        let mut members = BTreeMap::new();
        let mut topics = BTreeSet::new();
        let mut topics_per_member = BTreeMap::new();
        for (member_id, subscription) in subscriptions {
            let data = self.decode(subscription.user_data.as_deref());
            if data.previous_partitions.is_empty() {
                debug!(member_id = member_id.as_str(), "member owns no partitions");
            } else {
                debug!(
                    member_id = member_id.as_str(),
                    partitions = ?data.previous_partitions,
                    "member owns partitions",
                );
            }
            info!(
                member_id = member_id.as_str(),
                max_consumption_rate = data.max_consumption_rate,
                "declared consumption rate",
            );

            topics.extend(subscription.topics.iter().cloned());
            topics_per_member.insert(member_id.clone(), subscription.topics.clone());
            members.insert(member_id.clone(), data);
        }

        let report = self.estimate_lag(&topics).await?;

        let previous: BTreeMap<String, Vec<TopicPartition>> = members
            .iter()
            .map(|(member_id, data)| (member_id.clone(), data.previous_partitions.clone()))
            .collect();
        let input = AssignmentInput {
            partitions: &report.partitions,
            lags: &report.lags,
            subscriptions: &topics_per_member,
            previous: &previous,
        };

        let mut state = self.state.lock();
        if state.generation != started {
            return Err(Error::Superseded {
                started,
                current: state.generation,
            });
        }

        // work on a copy so a failed cycle leaves no trace
        let mut next = state.clone();
        let plan = bin_pack(&input, &mut next);

        let mut user_data = BTreeMap::new();
        for (member_id, partitions) in &plan {
            let declared = members
                .get(member_id)
                .map(|data| data.max_consumption_rate)
                .unwrap_or_default();
            let data = MemberData {
                previous_partitions: partitions.clone(),
                max_consumption_rate: declared,
                generation: Some(next.generation),
            };
            user_data.insert(member_id.clone(), self.encode(&data)?);
        }

        next.member_rates = members
            .iter()
            .map(|(member_id, data)| (member_id.clone(), data.max_consumption_rate))
            .collect();
        *state = next;

        for (member_id, partitions) in &plan {
            info!(
                member_id = member_id.as_str(),
                partitions = partitions.len(),
                "assigned partitions",
            );
        }

        Ok(GroupAssignment { plan, user_data })
    }

    fn on_acknowledge(&self, partitions: Vec<TopicPartition>, generation: i32) {
        info!(
            message = "received assignment",
            generation,
            partitions = partitions.len(),
        );
        for tp in &partitions {
            info!(topic = tp.topic.as_str(), partition = tp.partition, "owned partition");
        }

        let mut state = self.state.lock();
        state.generation = generation;
        state.owned = Some(partitions);
    }

    fn subscription_user_data(&self) -> Result<Option<Bytes>> {
        let state = self.state.lock();
        let Some(owned) = &state.owned else {
            return Ok(None);
        };

        let data = MemberData {
            previous_partitions: owned.clone(),
            max_consumption_rate: self.config.max_consumption_rate(),
            generation: Some(state.generation),
        };

        self.encode(&data).map(Some)
    }
}
