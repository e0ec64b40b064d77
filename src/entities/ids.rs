//! Typed identifiers for every entity family.
//!
//! Ids are random UUIDs generated at creation time and never reused.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|e| {
                    Error::InvalidInput(format!("{} '{s}' is not a UUID: {e}", stringify!($name)))
                })
            }
        }
    };
}

entity_id!(
    /// Identifies an [`Experiment`](super::Experiment).
    ExperimentId
);
entity_id!(
    /// Identifies a [`Run`](super::Run).
    RunId
);
entity_id!(
    /// Identifies a [`Metric`](super::Metric).
    MetricId
);
entity_id!(
    /// Identifies a [`HyperParameter`](super::HyperParameter).
    HyperParameterId
);
entity_id!(
    /// Identifies a logged [`Data`](super::Data) set.
    DataId
);
entity_id!(
    /// Identifies a [`DataColumn`](super::DataColumn).
    DataColumnId
);
entity_id!(
    /// Identifies a [`DataDistribution`](super::DataDistribution) entry.
    DataDistributionId
);
entity_id!(
    /// Identifies a [`DeploymentTarget`](super::DeploymentTarget).
    DeploymentTargetId
);
entity_id!(
    /// Identifies a [`Deployment`](super::Deployment).
    DeploymentId
);
entity_id!(
    /// Identifies a [`RunArtifact`](super::RunArtifact).
    RunArtifactId
);
entity_id!(
    /// Identifies a [`RegisteredModel`](super::RegisteredModel).
    RegisteredModelId
);
