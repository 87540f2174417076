use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// The two families of user-owned things reminders, history and videos hang off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Skincare,
    Fitness,
}

impl TargetKind {
    pub const ALL: [TargetKind; 2] = [TargetKind::Skincare, TargetKind::Fitness];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Skincare => "skincare",
            TargetKind::Fitness => "fitness",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skincare" => Ok(TargetKind::Skincare),
            "fitness" => Ok(TargetKind::Fitness),
            other => Err(ModelError::UnknownTargetKind(other.to_string())),
        }
    }
}

/// A skincare plan or a fitness item, addressed by kind and row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub kind: TargetKind,
    pub id: i64,
}

impl Target {
    pub fn skincare(plan_id: i64) -> Self {
        Self {
            kind: TargetKind::Skincare,
            id: plan_id,
        }
    }

    pub fn fitness(item_id: i64) -> Self {
        Self {
            kind: TargetKind::Fitness,
            id: item_id,
        }
    }
}
