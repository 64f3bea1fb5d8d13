pub mod build;
pub mod notification;

pub use build::{BuildContext, BuildOutcome, BuildResult, ParseBuildResultError};
pub use notification::{NotificationConfig, NotificationSettings, Trigger, TriggerPolicy};
