//! A lag-aware, sticky bin-pack partition assignor for Kafka consumer groups.
//!
//! The group leader reads the backlog of every subscribed partition and
//! spreads partitions over the members so that each ends up with about the
//! same number of partitions and the same total lag. Members report what they
//! owned after the previous rebalance through their subscription user data,
//! which lets the assignor keep a topic's first partition where it was.
//!
//! The crate does not talk to a cluster itself. The host client provides
//! topic metadata and offsets through [`cluster::TopicMetadata`] and
//! [`cluster::OffsetSource`] and drives the rebalance through
//! [`assignor::PartitionAssignor`].
//!
//! ```no_run
//! # async fn run(
//! #     metadata: std::sync::Arc<dyn lag_assignor::cluster::TopicMetadata>,
//! #     offsets: std::sync::Arc<dyn lag_assignor::cluster::OffsetSource>,
//! #     subscriptions: lag_assignor::assignor::GroupSubscription,
//! # ) -> lag_assignor::error::Result<()> {
//! use lag_assignor::assignor::{LagAwareAssignor, PartitionAssignor};
//! use lag_assignor::config::AssignorConfigBuilder;
//!
//! let config = AssignorConfigBuilder::new("billing").build()?;
//! let assignor = LagAwareAssignor::new(config, metadata, offsets);
//!
//! let assignment = assignor.assign(&subscriptions).await?;
//! for (member_id, partitions) in &assignment.plan {
//!     println!("{member_id}: {partitions:?}");
//! }
//! # Ok(())
//! # }
//! ```
#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(
    missing_copy_implementations,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

pub mod assignor;
pub mod cluster;
pub mod config;
pub mod error;
pub mod lag;
pub mod topic;

#[cfg(not(feature = "unstable-fuzzing"))]
mod protocol;
#[cfg(feature = "unstable-fuzzing")]
pub mod protocol;

pub use protocol::member_data::{MemberData, DEFAULT_GENERATION};
