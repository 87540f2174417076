use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{ModelError, target::Target, user::UserId};

pub type ReminderId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    /// Fires on an explicit set of weekdays.
    Custom,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Custom => "custom",
        }
    }
}

impl FromStr for Recurrence {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "custom" => Ok(Recurrence::Custom),
            other => Err(ModelError::UnknownRecurrence(other.to_string())),
        }
    }
}

/// Local time of day a reminder fires at, with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderFireTime(NaiveTime);

impl ReminderFireTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = inner
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(inner);
        Self(normalized_time)
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn into_time(self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for ReminderFireTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for ReminderFireTime {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self::new)
            .map_err(|_| ModelError::InvalidFireTime(s.to_string()))
    }
}

impl TryFrom<String> for ReminderFireTime {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReminderFireTime> for String {
    fn from(value: ReminderFireTime) -> Self {
        value.to_string()
    }
}

/// Sorted, de-duplicated set of weekday numbers, 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Weekdays(Vec<u8>);

impl Weekdays {
    pub fn new(days: impl IntoIterator<Item = u8>) -> Result<Self, ModelError> {
        let mut days: Vec<u8> = days.into_iter().collect();
        if let Some(bad) = days.iter().find(|d| **d > 6) {
            return Err(ModelError::InvalidWeekday(*bad));
        }
        days.sort_unstable();
        days.dedup();
        Ok(Self(days))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, day: u8) -> bool {
        self.0.binary_search(&day).is_ok()
    }

    pub fn days(&self) -> &[u8] {
        &self.0
    }

    /// Comma separated form used in the database, e.g. `1,3,5`.
    pub fn to_storage_string(&self) -> String {
        self.0
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn parse_storage_string(value: &str) -> Result<Self, ModelError> {
        let days = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u8>()
                    .map_err(|_| ModelError::UnparsableWeekday(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(days)
    }
}

impl TryFrom<Vec<u8>> for Weekdays {
    type Error = ModelError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Weekdays> for Vec<u8> {
    fn from(value: Weekdays) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSchedule {
    pub recurrence: Recurrence,
    pub interval: u32,
    pub fire_at: ReminderFireTime,
    #[serde(default)]
    pub weekdays: Weekdays,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    pub user_id: UserId,
    pub target: Target,
    #[serde(flatten)]
    pub schedule: ReminderSchedule,
    pub is_active: bool,
    pub next_reminder: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
