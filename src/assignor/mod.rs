//! Partition assignment for consumer groups.
//!
//! The group coordinator picks one member as leader and hands it the
//! subscriptions of all members. The leader's assignor decides which member
//! owns which partition until the next rebalance. Afterwards every member is
//! told its own partitions and acknowledges them.
//!
//! <https://developer.confluent.io/courses/architecture/consumer-group-protocol>

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::lag::LagReport;
use crate::protocol::member_data::{MemberData, DEFAULT_GENERATION};
use crate::topic::TopicPartition;

mod binpack;
mod lag_aware;

pub use binpack::{bin_pack, AssignmentInput};
pub use lag_aware::LagAwareAssignor;

/// Protocol name the assignor registers under in `JoinGroup`.
///
/// Kept identical across implementations so members written in other
/// languages agree on the strategy.
pub const ASSIGNOR_NAME: &str = "LagAndStickyAwareAssignor";

/// Partitions per member. Every subscribed member has an entry, possibly empty.
pub type AssignmentPlan = BTreeMap<String, Vec<TopicPartition>>;

/// What a member sent when joining the group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscription {
    pub topics: Vec<String>,
    pub user_data: Option<Bytes>,
}

/// Subscriptions of all members, keyed by member ID.
pub type GroupSubscription = BTreeMap<String, Subscription>;

/// Result of one rebalance, handed back to the group protocol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupAssignment {
    pub plan: AssignmentPlan,

    /// Encoded [`MemberData`] each member attaches to its next subscription.
    pub user_data: BTreeMap<String, Bytes>,
}

/// State an assignor instance keeps between rebalances.
///
/// Lives as long as the assignor and is never shared between instances.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceState {
    /// Last generation acknowledged by this member.
    pub generation: i32,

    /// Whether this instance already computed a plan.
    pub seen_first_rebalance: bool,

    /// Partitions this member acknowledged last, `None` before the first
    /// acknowledgement.
    pub owned: Option<Vec<TopicPartition>>,

    /// Declared consumption rate of each member at the last rebalance.
    pub member_rates: BTreeMap<String, f64>,
}

impl Default for RebalanceState {
    fn default() -> Self {
        Self {
            generation: DEFAULT_GENERATION,
            seen_first_rebalance: false,
            owned: None,
            member_rates: BTreeMap::new(),
        }
    }
}

/// A pluggable assignment strategy.
///
/// Host adapters bind to this trait instead of a concrete assignor.
#[async_trait]
pub trait PartitionAssignor: Send + Sync {
    /// Unique name for this assignor
    fn name(&self) -> &'static str;

    /// Decodes the user data of a member's subscription.
    fn decode(&self, user_data: Option<&[u8]>) -> MemberData {
        MemberData::decode(user_data.unwrap_or_default())
    }

    /// Encodes member data with the current schema.
    fn encode(&self, data: &MemberData) -> Result<Bytes> {
        Ok(data.encode()?)
    }

    /// Reads the lag of every partition of `topics`.
    async fn estimate_lag(&self, topics: &BTreeSet<String>) -> Result<LagReport>;

    /// Computes the assignment of the whole group. Called on the leader only.
    async fn assign(&self, subscriptions: &GroupSubscription) -> Result<GroupAssignment>;

    /// Called on every member once the group settled on a new generation.
    fn on_acknowledge(&self, partitions: Vec<TopicPartition>, generation: i32);

    /// User data this member sends with its next subscription, if any.
    fn subscription_user_data(&self) -> Result<Option<Bytes>>;
}
