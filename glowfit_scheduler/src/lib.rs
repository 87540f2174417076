pub mod delivery;
mod poller;
mod recurrence;

pub use delivery::{DueReminder, DueReminderSource, ReminderDeliveryChannel, ReminderOwner};
pub use poller::{DEFAULT_POLL_INTERVAL, DueReminderPoller, PollReport};
pub use recurrence::next_trigger;

#[cfg(test)]
mod tests;
