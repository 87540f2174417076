pub mod error;
pub mod history;
pub mod notification;
pub mod plan;
pub mod reminder;
pub mod target;
pub mod user;
pub mod video;

pub use chrono;
pub use chrono_tz;
pub use error::ModelError;
