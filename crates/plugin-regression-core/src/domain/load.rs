//! Datasets, load profiles and scenarios handed to performance test units.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Dataset the application under test is seeded with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    /// Location of the application home snapshot.
    pub home_location: String,
    /// Location of the database snapshot.
    pub database_location: String,
}

impl Dataset {
    pub fn new(name: &str, home_location: &str, database_location: &str) -> Self {
        Self {
            name: name.to_string(),
            home_location: home_location.to_string(),
            database_location: database_location.to_string(),
        }
    }
}

/// Shape of the simulated load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadProfile {
    /// Number of concurrent virtual users.
    pub virtual_users: u32,
    /// How long the full load is held.
    #[serde(with = "duration_secs")]
    pub hold: Duration,
    /// How long it takes to reach full load.
    #[serde(with = "duration_secs")]
    pub ramp: Duration,
    /// Optional overall throughput cap in requests per second.
    pub max_overall_load: Option<f64>,
    /// Seed for virtual user randomness, shared by both cohorts.
    pub seed: u64,
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self {
            virtual_users: 10,
            hold: Duration::from_secs(20 * 60),
            ramp: Duration::from_secs(90),
            max_overall_load: None,
            seed: 12345,
        }
    }
}

impl LoadProfile {
    /// Total time the load is applied, ramp included.
    pub fn total(&self) -> Duration {
        self.ramp + self.hold
    }
}

/// Identifier of the load scenario the virtual users execute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scenario(pub String);

impl Scenario {
    pub fn new(id: impl Into<String>) -> Self {
        Scenario(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
