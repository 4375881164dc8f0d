use std::collections::BTreeMap;

use tracing::info;

use crate::error::{Error, Result};
use crate::lag::OffsetResetPolicy;

pub const GROUP_ID_CONFIG: &str = "group.id";
pub const AUTO_OFFSET_RESET_CONFIG: &str = "auto.offset.reset";
pub const MAX_CONSUMPTION_RATE_CONFIG: &str = "max.consumption.rate";

/// Static settings of an assignor, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignorConfig {
    group_id: String,
    client_id: String,
    offset_reset: OffsetResetPolicy,
    max_consumption_rate: f64,
}

impl AssignorConfig {
    /// Builds the config from consumer properties.
    ///
    /// `group.id` is required. Unknown keys are ignored so the full consumer
    /// configuration can be passed through.
    pub fn from_properties(props: &BTreeMap<String, String>) -> Result<Self> {
        let group_id = props.get(GROUP_ID_CONFIG).ok_or_else(|| {
            Error::Configuration(format!(
                "{GROUP_ID_CONFIG} cannot be null when using the lag-aware assignor"
            ))
        })?;

        let mut builder = AssignorConfigBuilder::new(group_id.clone());
        if let Some(policy) = props.get(AUTO_OFFSET_RESET_CONFIG) {
            builder = builder.offset_reset(policy.parse()?);
        }
        if let Some(rate) = props.get(MAX_CONSUMPTION_RATE_CONFIG) {
            let rate = rate.parse::<f64>().map_err(|e| {
                Error::Configuration(format!("invalid {MAX_CONSUMPTION_RATE_CONFIG} '{rate}': {e}"))
            })?;
            builder = builder.max_consumption_rate(rate);
        }

        builder.build()
    }

    /// The consumer group this assignor works for.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Client ID the host should use for the metadata and offset lookups.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn offset_reset(&self) -> OffsetResetPolicy {
        self.offset_reset
    }

    /// The consumption rate this member declares to the group leader.
    pub fn max_consumption_rate(&self) -> f64 {
        self.max_consumption_rate
    }
}

/// Builder for [`AssignorConfig`].
#[derive(Debug)]
pub struct AssignorConfigBuilder {
    group_id: String,
    offset_reset: OffsetResetPolicy,
    max_consumption_rate: f64,
}

impl AssignorConfigBuilder {
    /// Create a new [`AssignorConfigBuilder`] for the given consumer group.
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            offset_reset: OffsetResetPolicy::default(),
            max_consumption_rate: 0.0,
        }
    }

    /// Sets the reset policy used when the group has no committed offset.
    pub fn offset_reset(mut self, policy: OffsetResetPolicy) -> Self {
        self.offset_reset = policy;
        self
    }

    /// Sets the self-declared maximum consumption rate.
    pub fn max_consumption_rate(mut self, rate: f64) -> Self {
        self.max_consumption_rate = rate;
        self
    }

    /// Build [`AssignorConfig`].
    pub fn build(self) -> Result<AssignorConfig> {
        if self.group_id.is_empty() {
            return Err(Error::Configuration(format!(
                "{GROUP_ID_CONFIG} cannot be empty"
            )));
        }
        if !self.max_consumption_rate.is_finite() || self.max_consumption_rate < 0.0 {
            return Err(Error::Configuration(format!(
                "{MAX_CONSUMPTION_RATE_CONFIG} must be a finite, non-negative number, got {}",
                self.max_consumption_rate
            )));
        }

        let client_id = format!("{}.assignor", self.group_id);
        info!(
            message = "configured lag-aware assignor",
            group_id = self.group_id.as_str(),
            client_id = client_id.as_str(),
            offset_reset = %self.offset_reset,
        );

        Ok(AssignorConfig {
            group_id: self.group_id,
            client_id,
            offset_reset: self.offset_reset,
            max_consumption_rate: self.max_consumption_rate,
        })
    }
}
