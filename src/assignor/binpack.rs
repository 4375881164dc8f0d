use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{AssignmentPlan, RebalanceState};
use crate::lag::PartitionLag;
use crate::topic::TopicPartition;

/// Everything the bin-pack needs besides the rebalance state.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentInput<'a> {
    /// Partition indexes of every topic with known metadata.
    pub partitions: &'a BTreeMap<String, Vec<i32>>,

    /// Lag samples per topic. Partitions without a sample count as no lag.
    pub lags: &'a BTreeMap<String, Vec<PartitionLag>>,

    /// Subscribed topics per member.
    pub subscriptions: &'a BTreeMap<String, Vec<String>>,

    /// Partitions per member after the previous rebalance.
    pub previous: &'a BTreeMap<String, Vec<TopicPartition>>,
}

/// Running load of a member within one plan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Load {
    partitions: usize,
    lag: i64,
}

/// Greedy lag-aware bin-pack.
///
/// Topics are visited in name order and their partitions in index order. Each
/// partition goes to the subscribed member with the fewest partitions, then
/// the smallest total lag, then the smallest member ID. Loads accumulate
/// across topics and placements are never revisited.
///
/// The first placement of a topic may go to a seed member instead, as long
/// as the seed is tied with the best candidate. On the very first rebalance
/// of this instance the seed is the first subscriber; afterwards it is the
/// previous owner of the topic's lowest partition.
pub fn bin_pack(input: &AssignmentInput<'_>, state: &mut RebalanceState) -> AssignmentPlan {
    let mut plan: AssignmentPlan = input
        .subscriptions
        .keys()
        .map(|member_id| (member_id.clone(), vec![]))
        .collect();
    let mut loads: BTreeMap<&str, Load> = input
        .subscriptions
        .keys()
        .map(|member_id| (member_id.as_str(), Load::default()))
        .collect();

    for (topic, consumers) in consumers_per_topic(input.subscriptions) {
        let mut partitions = match input.partitions.get(topic) {
            Some(partitions) if !partitions.is_empty() => partitions.clone(),
            _ => {
                debug!(topic, "no partitions known for subscribed topic");
                continue;
            }
        };
        partitions.sort_unstable();
        partitions.dedup();

        let lags: BTreeMap<i32, i64> = input
            .lags
            .get(topic)
            .map(|lags| lags.iter().map(|l| (l.partition, l.lag)).collect())
            .unwrap_or_default();

        let mut seed = seed_member(topic, &consumers, partitions[0], input.previous, state);

        for partition in partitions {
            let Some(best) = consumers.iter().copied().min_by_key(|m| (loads[m], *m)) else {
                break;
            };
            let member_id = match seed.take() {
                Some(seed) if loads[seed] == loads[best] => seed,
                _ => best,
            };

            let lag = lags.get(&partition).copied().unwrap_or_default();
            if let Some(load) = loads.get_mut(member_id) {
                load.partitions += 1;
                load.lag = load.lag.saturating_add(lag);
            }
            if let Some(assigned) = plan.get_mut(member_id) {
                assigned.push(TopicPartition::new(topic, partition));
            }

            debug!(topic, partition, lag, member_id, "placed partition");
        }
    }

    plan
}

/// Inverts the subscriptions. Members keep ID order and appear once per topic.
fn consumers_per_topic(subscriptions: &BTreeMap<String, Vec<String>>) -> BTreeMap<&str, Vec<&str>> {
    let mut consumers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (member_id, topics) in subscriptions {
        for topic in topics {
            let ids = consumers.entry(topic.as_str()).or_default();
            if !ids.contains(&member_id.as_str()) {
                ids.push(member_id.as_str());
            }
        }
    }

    consumers
}

fn seed_member<'a>(
    topic: &str,
    consumers: &[&'a str],
    first_partition: i32,
    previous: &BTreeMap<String, Vec<TopicPartition>>,
    state: &mut RebalanceState,
) -> Option<&'a str> {
    if !state.seen_first_rebalance {
        state.seen_first_rebalance = true;

        let seed = consumers.first().copied();
        info!(topic, seed, "first rebalance, seeding with the initial member");
        return seed;
    }

    consumers.iter().copied().find(|member_id| {
        previous.get(*member_id).is_some_and(|owned| {
            owned
                .iter()
                .any(|tp| tp.topic == topic && tp.partition == first_partition)
        })
    })
}
