pub mod error;
pub mod files;
pub mod history;
pub mod notification;
pub mod plan;
pub mod reminder;
pub mod sqlite;
pub mod stats;
pub mod user;
pub mod video;

pub use error::{StorageError, StorageResult};
pub use files::{CleanupReport, FileJanitor, OrphanedFile};
pub use history::{HistoryExportRow, HistoryFilter, HistoryStorage, NewHistoryRecord};
pub use notification::{NewNotification, NotificationStorage};
pub use plan::{FitnessItemInput, PlanStorage, SkincarePlanInput};
pub use reminder::{NewReminder, ReminderStorage, UpdateReminder};
pub use stats::{AdminStats, StatsStorage};
pub use user::{NewUser, UpdateUserSettings, UserCredentials, UserStorage};
pub use video::{NewVideo, VideoStorage};
