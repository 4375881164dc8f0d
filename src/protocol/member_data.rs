//! Sticky user data carried in each member's subscription.
//!
//! The payload is opaque to the group coordinator. It travels as the
//! `user_data` bytes of the `ConsumerProtocolSubscription` and lets the group
//! leader see what every member owned after the previous rebalance, together
//! with the member's self-declared consumption rate.
//!
//! Two schema versions exist:
//!
//! ```text
//! V0:
//!   previous_assignment: [TopicAssignment]
//!
//! V1:
//!   previous_assignment: [TopicAssignment]
//!   generation: INT32
//!   max_consumption_rate: FLOAT64
//!
//! TopicAssignment:
//!   topic: STRING
//!   partitions: [INT32]
//! ```
//!
//! The payload carries no version marker, so decoding tries the schemas from
//! newest to oldest and takes the first one that parses.

use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use tracing::{debug, warn};

use super::traits::{read_array_len, write_array_len, ReadError, ReadType, WriteError, WriteType};
use crate::topic::{group_by_topic, TopicPartition};

/// Generation reported by a consumer that has not completed a rebalance yet.
pub const DEFAULT_GENERATION: i32 = -1;

/// The per-member sticky state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberData {
    /// Partitions the member owned after the previous rebalance.
    pub previous_partitions: Vec<TopicPartition>,

    /// Records per second the member declared it is able to consume.
    pub max_consumption_rate: f64,

    /// Generation of the rebalance that produced `previous_partitions`.
    pub generation: Option<i32>,
}

impl MemberData {
    /// Decodes the user data of a subscription.
    ///
    /// Never fails: empty input and input that matches none of the known
    /// schemas both decode to [`MemberData::default`].
    pub fn decode(buf: &[u8]) -> Self {
        if buf.is_empty() {
            return Self::default();
        }

        let mut last_err = None;
        for (version, read) in SCHEMAS {
            match read(&mut Cursor::new(buf)) {
                Ok(data) => {
                    if version != CURRENT_VERSION {
                        debug!(version, "decoded member data with a legacy schema");
                    }

                    return data;
                }
                Err(err) => last_err = Some(err),
            }
        }

        warn!(
            message = "ignoring unparsable member data",
            len = buf.len(),
            error = ?last_err,
        );

        Self::default()
    }

    /// Encodes with the current schema.
    ///
    /// Partitions are grouped by topic, `generation` is only written if
    /// present and `max_consumption_rate` is always written.
    pub fn encode(&self) -> Result<Bytes, WriteError> {
        let data = StickyUserDataV1 {
            previous_assignment: group_by_topic(&self.previous_partitions)
                .into_iter()
                .map(|(topic, partitions)| TopicAssignment {
                    topic: topic.to_string(),
                    partitions,
                })
                .collect(),
            generation: self.generation,
            max_consumption_rate: self.max_consumption_rate,
        };

        let mut buf = Vec::new();
        data.write(&mut buf)?;

        Ok(buf.into())
    }
}

const CURRENT_VERSION: i16 = 1;

type SchemaReader = fn(&mut Cursor<&[u8]>) -> Result<MemberData, ReadError>;

/// Known schemas, newest first.
const SCHEMAS: [(i16, SchemaReader); 2] = [(1, read_v1), (0, read_v0)];

fn read_v1(reader: &mut Cursor<&[u8]>) -> Result<MemberData, ReadError> {
    StickyUserDataV1::read(reader).map(MemberData::from)
}

fn read_v0(reader: &mut Cursor<&[u8]>) -> Result<MemberData, ReadError> {
    StickyUserDataV0::read(reader).map(MemberData::from)
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
struct TopicAssignment {
    topic: String,
    partitions: Vec<i32>,
}

impl<R> ReadType<R> for TopicAssignment
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let topic = String::read(reader)?;
        let partitions = Vec::<i32>::read(reader)?;

        Ok(Self { topic, partitions })
    }
}

impl<W> WriteType<W> for TopicAssignment
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.topic.write(writer)?;
        self.partitions.write(writer)
    }
}

fn read_assignments<R: Read>(reader: &mut R) -> Result<Vec<TopicAssignment>, ReadError> {
    let len = read_array_len(reader)?;
    let mut assignments = Vec::new();
    for _i in 0..len {
        assignments.push(TopicAssignment::read(reader)?);
    }

    Ok(assignments)
}

fn flatten(assignments: Vec<TopicAssignment>) -> Vec<TopicPartition> {
    assignments
        .into_iter()
        .flat_map(|TopicAssignment { topic, partitions }| {
            partitions
                .into_iter()
                .map(move |partition| TopicPartition::new(topic.clone(), partition))
        })
        .collect()
}

#[derive(Debug)]
struct StickyUserDataV0 {
    previous_assignment: Vec<TopicAssignment>,
}

impl<R> ReadType<R> for StickyUserDataV0
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            previous_assignment: read_assignments(reader)?,
        })
    }
}

impl From<StickyUserDataV0> for MemberData {
    fn from(data: StickyUserDataV0) -> Self {
        Self {
            previous_partitions: flatten(data.previous_assignment),
            max_consumption_rate: 0.0,
            generation: None,
        }
    }
}

#[derive(Debug)]
struct StickyUserDataV1 {
    previous_assignment: Vec<TopicAssignment>,
    generation: Option<i32>,
    max_consumption_rate: f64,
}

impl<R> ReadType<R> for StickyUserDataV1
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let previous_assignment = read_assignments(reader)?;
        let generation = i32::read(reader)?;
        let max_consumption_rate = f64::read(reader)?;

        Ok(Self {
            previous_assignment,
            generation: Some(generation),
            max_consumption_rate,
        })
    }
}

impl<W> WriteType<W> for StickyUserDataV1
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        write_array_len(writer, self.previous_assignment.len())?;
        for assignment in &self.previous_assignment {
            assignment.write(writer)?;
        }

        if let Some(generation) = self.generation {
            generation.write(writer)?;
        }
        self.max_consumption_rate.write(writer)
    }
}

impl From<StickyUserDataV1> for MemberData {
    fn from(data: StickyUserDataV1) -> Self {
        Self {
            previous_partitions: flatten(data.previous_assignment),
            max_consumption_rate: data.max_consumption_rate,
            generation: data.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn member_data() -> impl Strategy<Value = MemberData> {
        (
            prop::collection::btree_map(
                "[a-z][a-z0-9._-]{0,12}",
                prop::collection::vec(0..1024i32, 1..6),
                0..4,
            ),
            -1.0e9..1.0e9f64,
            any::<i32>(),
        )
            .prop_map(|(topics, max_consumption_rate, generation)| MemberData {
                previous_partitions: topics
                    .into_iter()
                    .flat_map(|(topic, partitions)| {
                        partitions
                            .into_iter()
                            .map(move |p| TopicPartition::new(topic.clone(), p))
                    })
                    .collect(),
                max_consumption_rate,
                generation: Some(generation),
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig{fork: false, ..Default::default()})]
        #[test]
        fn member_data_roundtrip(orig in member_data()) {
            let buf = orig.encode().unwrap();
            prop_assert_eq!(MemberData::decode(&buf), orig);
        }

        #[test]
        fn decode_never_panics(buf in prop::collection::vec(any::<u8>(), 0..128)) {
            let _ = MemberData::decode(&buf);
        }
    }

    #[test]
    fn decode_empty() {
        assert_eq!(MemberData::decode(&[]), MemberData::default());
        assert_eq!(
            MemberData::default(),
            MemberData {
                previous_partitions: vec![],
                max_consumption_rate: 0.0,
                generation: None,
            }
        );
    }

    #[test]
    fn encode_v1() {
        let data = MemberData {
            previous_partitions: vec![TopicPartition::new("one", 0), TopicPartition::new("one", 2)],
            max_consumption_rate: 1.0,
            generation: Some(64),
        };
        let want = [
            0, 0, 0, 1, // Topic array length
            0, 3, b'o', b'n', b'e', // Topic one
            0, 0, 0, 2, // Partition array length
            0, 0, 0, 0, 0, 0, 0, 2, // 0, 2
            0, 0, 0, 64, // Generation
            0x3f, 0xf0, 0, 0, 0, 0, 0, 0, // MaxConsumptionRate
        ];

        let got = data.encode().unwrap();
        assert_eq!(got.as_ref(), want.as_ref());
        assert_eq!(MemberData::decode(&got), data);
    }

    #[test]
    fn encode_groups_by_topic() {
        let data = MemberData {
            previous_partitions: vec![
                TopicPartition::new("b", 1),
                TopicPartition::new("a", 0),
                TopicPartition::new("b", 0),
            ],
            max_consumption_rate: 0.0,
            generation: Some(3),
        };

        let decoded = MemberData::decode(&data.encode().unwrap());
        assert_eq!(
            decoded.previous_partitions,
            vec![
                TopicPartition::new("b", 1),
                TopicPartition::new("b", 0),
                TopicPartition::new("a", 0),
            ]
        );
        assert_eq!(decoded.generation, Some(3));
    }

    #[test]
    fn decode_v0() {
        let v0 = [
            0, 0, 0, 1, // Topic array length
            0, 3, b'o', b'n', b'e', // Topic one
            0, 0, 0, 1, // Partition array length
            0, 0, 0, 5, // 5
        ];

        assert_eq!(
            MemberData::decode(&v0),
            MemberData {
                previous_partitions: vec![TopicPartition::new("one", 5)],
                max_consumption_rate: 0.0,
                generation: None,
            }
        );
    }

    #[test]
    fn roundtrip_without_generation() {
        let data = MemberData {
            previous_partitions: vec![TopicPartition::new("t", 7)],
            max_consumption_rate: 0.0,
            generation: None,
        };

        assert_eq!(MemberData::decode(&data.encode().unwrap()), data);
    }

    #[test]
    fn decode_truncated_garbage() {
        let data = MemberData {
            previous_partitions: vec![TopicPartition::new("orders", 1)],
            max_consumption_rate: 12.5,
            generation: Some(2),
        };
        let buf = data.encode().unwrap();

        // cut inside the topic name
        assert_eq!(MemberData::decode(&buf[..8]), MemberData::default());
        assert_eq!(
            MemberData::decode(&[0xff, 0xff, 0xff, 0xff, 0x01]),
            MemberData::default()
        );
    }

    #[test]
    fn encode_topic_name_too_long() {
        let data = MemberData {
            previous_partitions: vec![TopicPartition::new("x".repeat(40_000), 0)],
            ..Default::default()
        };

        data.encode().unwrap_err();
    }
}
