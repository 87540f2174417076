use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown target kind `{0}`")]
    UnknownTargetKind(String),

    #[error("unknown recurrence `{0}`")]
    UnknownRecurrence(String),

    #[error("unknown role `{0}`")]
    UnknownRole(String),

    #[error("unknown notification kind `{0}`")]
    UnknownNotificationKind(String),

    #[error("weekday must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidWeekday(u8),

    #[error("weekday must be a number, got `{0}`")]
    UnparsableWeekday(String),

    #[error("time of day must look like 13:00, got `{0}`")]
    InvalidFireTime(String),
}
