use std::fmt;

/// A single partition of a topic.
///
/// Ordered by topic name first, then by partition index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct TopicPartition {
    /// The name of the topic.
    #[cfg_attr(test, proptest(strategy = "\"[a-z][a-z0-9._-]{0,8}\""))]
    pub topic: String,

    /// The partition index.
    #[cfg_attr(test, proptest(strategy = "0..64i32"))]
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// Groups partitions by topic.
///
/// Topics keep the order of their first appearance and partitions keep their
/// order within a topic.
pub fn group_by_topic<'a>(
    partitions: impl IntoIterator<Item = &'a TopicPartition>,
) -> Vec<(&'a str, Vec<i32>)> {
    let mut grouped: Vec<(&'a str, Vec<i32>)> = Vec::new();
    for tp in partitions {
        match grouped.iter_mut().find(|(topic, _)| *topic == tp.topic) {
            Some((_, indexes)) => indexes.push(tp.partition),
            None => grouped.push((tp.topic.as_str(), vec![tp.partition])),
        }
    }

    grouped
}
