//! Scenario names and the enabled-scenario bitmask

use crate::error::EngineError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of characters in a scenario mask
pub const MASK_LEN: usize = 8;

/// A user action simulated against the backend.
///
/// Declaration order is the bit order of the scenario mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScenarioKind {
    QueryAndPreserve,
    QueryAndPay,
    QueryAndCancel,
    QueryAndCollect,
    QueryAndExecute,
    QueryAndConsign,
    QueryAndRebook,
    QueryOnlyHighSpeed,
}

impl ScenarioKind {
    pub fn all() -> &'static [ScenarioKind; MASK_LEN] {
        &[
            ScenarioKind::QueryAndPreserve,
            ScenarioKind::QueryAndPay,
            ScenarioKind::QueryAndCancel,
            ScenarioKind::QueryAndCollect,
            ScenarioKind::QueryAndExecute,
            ScenarioKind::QueryAndConsign,
            ScenarioKind::QueryAndRebook,
            ScenarioKind::QueryOnlyHighSpeed,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::QueryAndPreserve => "QueryAndPreserve",
            ScenarioKind::QueryAndPay => "QueryAndPay",
            ScenarioKind::QueryAndCancel => "QueryAndCancel",
            ScenarioKind::QueryAndCollect => "QueryAndCollect",
            ScenarioKind::QueryAndExecute => "QueryAndExecute",
            ScenarioKind::QueryAndConsign => "QueryAndConsign",
            ScenarioKind::QueryAndRebook => "QueryAndRebook",
            ScenarioKind::QueryOnlyHighSpeed => "QueryOnlyHighSpeed",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = EngineError;

    /// Accepts the scenario name in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioKind::all()
            .iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| EngineError::UnknownScenario(s.to_string()))
    }
}

/// The scenarios a load test draws from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSet {
    enabled: Vec<ScenarioKind>,
}

impl ScenarioSet {
    /// Every scenario enabled
    pub fn all() -> Self {
        Self {
            enabled: ScenarioKind::all().to_vec(),
        }
    }

    /// Parse a mask such as `"10110001"`; character `i` enables scenario `i`
    pub fn from_mask(mask: &str) -> Result<Self, EngineError> {
        let invalid = |reason: &str| EngineError::InvalidScenarioMask {
            mask: mask.to_string(),
            reason: reason.to_string(),
        };

        if mask.chars().count() != MASK_LEN {
            return Err(invalid("expected exactly 8 characters"));
        }

        let mut enabled = Vec::with_capacity(MASK_LEN);
        for (bit, kind) in mask.chars().zip(ScenarioKind::all()) {
            match bit {
                '1' => enabled.push(*kind),
                '0' => {}
                _ => return Err(invalid("only '0' and '1' are allowed")),
            }
        }

        if enabled.is_empty() {
            return Err(invalid("at least one scenario must be enabled"));
        }

        Ok(Self { enabled })
    }

    pub fn enabled(&self) -> &[ScenarioKind] {
        &self.enabled
    }

    pub fn contains(&self, kind: ScenarioKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    pub fn to_mask(&self) -> String {
        ScenarioKind::all()
            .iter()
            .map(|kind| if self.contains(*kind) { '1' } else { '0' })
            .collect()
    }

    /// Uniformly pick one enabled scenario
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> ScenarioKind {
        self.enabled
            .choose(rng)
            .copied()
            .unwrap_or(ScenarioKind::QueryOnlyHighSpeed)
    }
}

impl Default for ScenarioSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for ScenarioSet {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mask(s)
    }
}

impl fmt::Display for ScenarioSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_mask())
    }
}
